pub mod descriptor;
pub mod nhk;
mod raii_process_driver;

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Client;

/// Shared HTTP client for descriptor and thumbnail fetches.
/// Lazily initialized so connections are pooled across episodes in a run.
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

pub fn http_client() -> &'static Client {
    HTTP_CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .build()
            .expect("Failed to create HTTP client")
    })
}
