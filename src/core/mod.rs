pub mod auth;
pub mod batch;
pub mod clock;
pub mod dispatcher;
pub mod filename;
pub mod http_client;
pub mod media_stream;
pub mod scheduler;
pub mod url_parser;
pub mod ytdlp;

#[cfg(test)]
pub mod test_support;
