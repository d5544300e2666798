#[macro_use]
extern crate rocket;

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod seed;
pub mod store;

use crate::config::{LISTEN_PORT, StorageConfig};
use crate::request_logger::RequestLogger;
use crate::store::ArchiveContext;
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::figment::providers::{Env as FigmentEnv, Format, Toml};
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::Once;

static LOGGER: Once = Once::new();

pub fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

/// Rocket configuration listening on [`LISTEN_PORT`] on all interfaces,
/// still overridable through `Rocket.toml` and `ROCKET_*` variables.
pub fn figment() -> Figment {
    Figment::from(rocket::Config::default())
        .merge(("address", "0.0.0.0"))
        .merge(("port", LISTEN_PORT))
        .merge(Toml::file(FigmentEnv::var_or("ROCKET_CONFIG", "Rocket.toml")).nested())
        .merge(FigmentEnv::prefixed("ROCKET_").ignore(&["PROFILE"]).global())
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    log::info!("starting email archive server");

    // Configure CORS
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .to_cors()
        .expect("Error creating CORS");

    rocket::custom(figment())
        .attach(RequestLogger)
        .attach(cors)
        // Probe PostgreSQL once; the chosen backend is fixed from here on.
        .attach(AdHoc::try_on_ignite(
            "Archive Storage",
            |rocket| async move {
                let config = StorageConfig::from_env();
                let context = ArchiveContext::connect(&config).await;

                if let Some(pool) = context.pool() {
                    if let Err(e) = db::ensure_schema(pool).await {
                        log::error!("database migrations failed: {}", e);
                        return Err(rocket);
                    }
                }

                Ok(rocket.manage(context))
            },
        ))
        .attach(AdHoc::on_liftoff("Startup Banner", |rocket| {
            Box::pin(async move {
                let config = rocket.config();
                log::info!(
                    "email server running on http://{}:{}",
                    config.address,
                    config.port
                );
                log::info!("use POST /populate to generate dummy emails");
            })
        }))
        .mount(
            "/",
            openapi_get_routes![
                routes::health::health_check,
                routes::emails::list_emails,
                routes::emails::count_emails,
                routes::emails::get_email_body,
                routes::admin::populate,
            ],
        )
        .mount(
            "/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Email Archive API", "../../openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};

    use crate::store::ArchiveContext;

    pub use database::{TestDatabase, TestDatabaseError};

    pub mod database {
        use log::LevelFilter;
        use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use sqlx::{ConnectOptions, PgPool};
        use testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use testcontainers_modules::postgres::Postgres;
        use thiserror::Error;

        use crate::config::StorageConfig;
        use crate::db::MIGRATOR;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Disposable PostgreSQL instance for integration tests.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            config: StorageConfig,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            /// Launch a container with the schema already applied.
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let database = Self::new_without_schema().await?;
                MIGRATOR.run(database.pool()).await?;
                Ok(database)
            }

            /// Launch a container without running migrations.
            pub async fn new_without_schema() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().start().await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let config = StorageConfig {
                    host,
                    port,
                    database: "postgres".to_string(),
                    user: "postgres".to_string(),
                    password: "postgres".to_string(),
                    max_connections: 5,
                    ..StorageConfig::default()
                };

                let options: PgConnectOptions =
                    config.connect_options().log_statements(LevelFilter::Off);
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect_with(options)
                    .await?;

                Ok(Self {
                    pool: Some(pool),
                    config,
                    container: Some(container),
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Storage settings pointing at this container.
            pub fn config(&self) -> &StorageConfig {
                &self.config
            }

            /// Close pool connections and stop the container.
            pub async fn close(mut self) {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }
                if let Some(container) = self.container.take() {
                    drop(container);
                }
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    #[derive(Default)]
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        context: Option<ArchiveContext>,
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                mounts: Vec::new(),
                context: None,
            }
        }

        /// Mount routes at the root, as the server does.
        pub fn mount_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/".to_string(), routes));
            self
        }

        /// Manage the storage context handed to handlers.
        pub fn manage_context(mut self, context: ArchiveContext) -> Self {
            self.context = Some(context);
            self
        }

        /// Finish building the Rocket instance.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment);

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            rocket.manage(self.context.unwrap_or_else(ArchiveContext::in_memory))
        }

        /// Convenience helper to produce a blocking local client.
        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        /// Convenience helper to produce an asynchronous local client.
        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
