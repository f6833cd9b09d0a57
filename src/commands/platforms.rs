use vidgrab_core::Capability;

use crate::AppContext;

pub fn run(ctx: &AppContext) {
    for backend in ctx.dispatcher.backends() {
        let caps: Vec<String> = backend
            .capabilities()
            .iter()
            .map(|c: Capability| c.to_string().to_lowercase())
            .collect();
        let caps = if caps.is_empty() {
            "-".to_string()
        } else {
            caps.join(", ")
        };
        println!("{:<10} {:<10} {}", backend.platform(), backend.name(), caps);
    }
}
