// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::io::Read;
use std::process::ExitCode;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use catalog_applier::apply::apply;
use catalog_applier::catalog::{CatalogDecoder, YamlCatalogDecoder};
use catalog_applier::logger::TracingLogger;
use catalog_applier::system::LocalSystem;

fn print_usage() {
    eprintln!("usage: catalog-applier <file> | -   (reads stdin with '-' or no argument)");
    eprintln!("       catalog-applier --version");
}

fn read_catalog_bytes(arg: Option<&str>) -> anyhow::Result<Vec<u8>> {
    match arg {
        None | Some("-") => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("reading catalog from stdin")?;
            Ok(bytes)
        }
        Some(path) => std::fs::read(path).with_context(|| format!("reading catalog file {path}")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let first = args.next();

    if first.as_deref() == Some("--version") {
        println!("catalog-applier {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if first.as_deref() == Some("--help") || first.as_deref() == Some("-h") {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let bytes = match read_catalog_bytes(first.as_deref()) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let catalog = match YamlCatalogDecoder.decode(&bytes) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let ctx = CancellationToken::new();
    let ctx_for_signal = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctx_for_signal.cancel();
        }
    });

    let system = LocalSystem::default();
    let logger = TracingLogger;

    match apply(&ctx, &system, &logger, &catalog).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
