use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

use tomlit_lsp::TomlLanguageServer;

fn cache_dir() -> std::path::PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("tomlit"))
        .unwrap_or_else(|| std::env::temp_dir().join("tomlit"))
}

#[tokio::main]
async fn main() {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cache = cache_dir();
    let (service, socket) = LspService::new(move |client| {
        TomlLanguageServer::new(client, cache.clone())
    });
    Server::new(stdin(), stdout(), socket).serve(service).await;
}
