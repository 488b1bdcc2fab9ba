//! Fetch command - send a request through the active worker

use crate::cli::args::FetchArgs;
use crate::cli::commands::LoadedRegistration;
use crate::config::Config;
use crate::error::{ShellError, ShellResult};
use crate::network::{Method, Request, Response};
use crate::worker::FetchOutcome;
use std::io::Write;
use tracing::info;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> ShellResult<()> {
    let method: Method = args.method.parse()?;
    let request = build_request(method, &args);

    // Write-through entries land in the cache; the record itself is unchanged
    let loaded = LoadedRegistration::open(config).await?;
    let outcome = loaded.registration.handle_fetch(&request).await?;

    let source = outcome.source();
    let response = match outcome {
        FetchOutcome::Passthrough => loaded.registration.network().fetch(&request).await?,
        FetchOutcome::Network(response) | FetchOutcome::Cache(response) => response,
    };
    info!(
        "{} {} -> {} (from {})",
        request.method, request.url, response.status, source
    );

    match args.output {
        Some(path) => tokio::fs::write(&path, &response.body)
            .await
            .map_err(|e| ShellError::io(format!("writing body to {}", path.display()), e))?,
        None => write_response(&response, source, args.include)?,
    }

    Ok(())
}

fn build_request(method: Method, args: &FetchArgs) -> Request {
    let mut request = Request::new(method, args.url.clone());
    for (name, value) in &args.headers {
        request = request.with_header(name.clone(), value.clone());
    }
    if let Some(ref data) = args.data {
        request = request.with_body(data.as_bytes().to_vec());
    }
    request
}

fn write_response(response: &Response, source: &str, include: bool) -> ShellResult<()> {
    let mut stdout = std::io::stdout().lock();
    let write = |out: &mut std::io::StdoutLock<'_>| -> std::io::Result<()> {
        if include {
            writeln!(out, "HTTP {} (from {})", response.status, source)?;
            for (name, value) in &response.headers {
                writeln!(out, "{}: {}", name, value)?;
            }
            writeln!(out)?;
        }
        out.write_all(&response.body)?;
        out.flush()
    };
    write(&mut stdout).map_err(|e| ShellError::io("writing response to stdout", e))
}
