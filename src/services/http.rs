use once_cell::sync::Lazy;
use reqwest::Client;

/// Shared HTTP client with a custom User-Agent so that public OSM-ecosystem
/// services (Nominatim, OSRM instances) don't reject the request. Building
/// the client once avoids the cost of TLS and connection pool setup for
/// every call.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent("waymark/0.1 (+https://github.com/example/waymark)")
        .build()
        .expect("failed to build reqwest client")
});
