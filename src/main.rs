use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;
mod config;

mod domain {
    pub mod headers;
    pub mod validation;
    pub mod entities {
        pub mod candidate;
        pub mod duplicates;
    }
}

mod usecase {
    pub mod ports {
        pub mod backend;
    }
    pub mod services {
        pub mod duplicate_service;
        pub mod import_service;
        pub mod job_service;
        pub mod upload_service;
    }
}

mod infra {
    pub mod export {
        pub mod template;
    }
    pub mod http {
        pub mod client;
    }
    pub mod import {
        pub mod csv;
        pub mod xlsx;
    }
}

mod platform {
    pub mod desktop {
        pub mod blocking;
        pub mod dialogs;
    }
}

mod ui {
    pub mod state {
        pub mod app_state;
        pub mod session;
    }
}

#[cfg(test)]
mod tests;

use crate::app::{App, AppServices};
use crate::config::AppConfig;
use crate::infra::http::client::HttpBackend;

fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err:#}");
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_filter);

    let backend = match HttpBackend::new(&config) {
        Ok(backend) => backend,
        Err(err) => {
            error!("failed to build http client: {err}");
            std::process::exit(1);
        }
    };
    info!(api = %config.api_base_url, "starting recruiter desk");

    let webview_data_dir = match default_webview_data_dir() {
        Ok(dir) => dir,
        Err(err) => {
            error!("failed to prepare webview data directory: {err:#}");
            std::process::exit(1);
        }
    };

    let services = AppServices::new(Arc::new(backend), &config);

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(
                    dioxus::desktop::WindowBuilder::new().with_title("Recruiter Desk"),
                )
                .with_data_directory(webview_data_dir),
        )
        .with_context(services)
        .launch(App);
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

fn default_webview_data_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "recruiterdesk", "recruiter-desk")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    ensure_webview_data_dir(project_dirs.data_local_dir())
}
