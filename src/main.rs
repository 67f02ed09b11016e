#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() {
    use std::net::{SocketAddr, SocketAddrV4};
    use std::sync::Arc;

    use axum::Router;
    use hack_or_snooze::app::hack_or_snooze::HackOrSnoozeClient;
    use hack_or_snooze::app::App;
    use hack_or_snooze::config::ServerConfig;
    use hack_or_snooze::fileserv::file_and_error_handler;
    use leptos::leptos_config::Env;
    use leptos::*;
    use leptos_axum::{generate_route_list, LeptosRoutes};
    use tracing::{error, info};
    use tracing_subscriber::{fmt, EnvFilter};

    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let conf = match get_configuration(None).await {
        Ok(conf) => conf,
        Err(err) => {
            error!("failed to load leptos configuration: {err}");
            return;
        }
    };
    let mut leptos_options = conf.leptos_options;
    leptos_options.hash_files = true;
    if leptos_options.env == Env::PROD {
        // the container image keeps hash.txt next to the release binary
        leptos_options.hash_file = "/app/target/release/hash.txt".to_string();
    }

    let addr = match std::env::var("PORT").map(|port| port.parse::<u16>()) {
        Ok(Ok(port)) => SocketAddr::V4(SocketAddrV4::new([0, 0, 0, 0].into(), port)),
        Ok(Err(err)) => {
            error!("`PORT` must be a u16: {err}");
            return;
        }
        Err(_) => leptos_options.site_addr,
    };
    let cloned_leptos_options = leptos_options.clone();
    let routes = generate_route_list(App);

    let config = ServerConfig::load();
    info!("proxying story api at {}", config.api_base_url);
    let api = Arc::new(HackOrSnoozeClient::from_config(&config));

    let app = Router::new()
        .leptos_routes_with_context(
            &leptos_options,
            routes,
            move || {
                provide_context(api.clone());
                provide_context(cloned_leptos_options.clone());
            },
            App,
        )
        .fallback(file_and_error_handler)
        .with_state(leptos_options);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            return;
        }
    };
    info!("listening on http://{}", &addr);
    if let Err(err) = axum::serve(listener, app.into_make_service()).await {
        error!("server error: {err}");
    }
}

#[cfg(not(feature = "ssr"))]
pub fn main() {
    // no client-side main function
    // see lib.rs for hydration function instead
}
