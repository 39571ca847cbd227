//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, PaginationArgs};
use crate::error::{Error, Result};
use crate::pagination::{PaginationOptions, PaginationType};
use crate::service::{HttpServiceClient, RequestParams, ServiceConfig};
use crate::types::JsonValue;
use futures::TryStreamExt;
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Get { path } => self.get(path).await,
            Commands::Paginate { path, pagination } => self.paginate(path, pagination).await,
        }
    }

    async fn get(&self, path: &str) -> Result<()> {
        let client = self.client()?;
        let response = client.get(path, self.request_params()?).await?;
        let body = response.text().await?;

        match serde_json::from_str::<JsonValue>(&body) {
            Ok(json) => self.output(&json),
            Err(_) => println!("{body}"),
        }
        Ok(())
    }

    async fn paginate(&self, path: &str, args: &PaginationArgs) -> Result<()> {
        let client = self.client()?;
        let options = pagination_options(args)?;
        debug!("Paginating {} with {:?}", client.build_url(path), options);

        let stream = client.paginate::<JsonValue>(path, self.request_params()?, options);
        futures::pin_mut!(stream);

        let mut count = 0usize;
        while let Some(item) = stream.try_next().await? {
            self.output(&item);
            count += 1;
            if args.max_items.is_some_and(|max| count >= max) {
                break;
            }
        }

        debug!("Printed {} items", count);
        Ok(())
    }

    /// Load the service config, letting `--url` override the file
    fn load_config(&self) -> Result<ServiceConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ServiceConfig::from_yaml_file(path)
                .map_err(|e| Error::config(format!("Failed to load {}: {e}", path.display())))?,
            None => {
                let url = self.cli.url.as_ref().ok_or_else(|| {
                    Error::config("Service URL not specified (use --url or --config)")
                })?;
                ServiceConfig::new(url)
            }
        };

        if let Some(url) = &self.cli.url {
            config.url.clone_from(url);
        }
        Ok(config)
    }

    fn client(&self) -> Result<HttpServiceClient> {
        HttpServiceClient::new(self.load_config()?)
    }

    /// Per-call parameters from the command-line flags
    fn request_params(&self) -> Result<RequestParams> {
        let mut params = RequestParams::new();

        for raw in &self.cli.headers {
            let (name, value) = parse_header(raw)?;
            params = params.header(name, value);
        }
        for raw in &self.cli.query {
            let (name, value) = parse_query(raw)?;
            params = params.query(name, value);
        }
        if !self.cli.expect.is_empty() {
            params = params.expect(self.cli.expect.iter().copied());
        }
        if let Some(retries) = self.cli.retries {
            params = params.retries(retries);
        }

        Ok(params)
    }

    fn output(&self, value: &JsonValue) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(value).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
            }
        }
    }
}

/// Build pagination options from the `paginate` flags
pub(crate) fn pagination_options(args: &PaginationArgs) -> Result<PaginationOptions> {
    let mut options = PaginationOptions::new()
        .page_param(&args.page_param)
        .page_size_param(&args.page_size_param)
        .page_size(args.page_size)
        .pagination_type(args.pagination_type.parse::<PaginationType>()?);

    if let Some(start) = args.start {
        options = options.start(start);
    }
    if let Some(key) = &args.results_key {
        options = options.results_key(key);
    }
    if let Some(key) = &args.next_key {
        options = options.next_key(key);
    }
    Ok(options)
}

/// Split a `name:value` header flag
pub(crate) fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw.split_once(':').ok_or_else(|| Error::InvalidHeader {
        name: raw.to_string(),
        message: "expected name:value".to_string(),
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidHeader {
            name: raw.to_string(),
            message: "empty header name".to_string(),
        });
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Split a `name=value` query flag
pub(crate) fn parse_query(raw: &str) -> Result<(String, String)> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| Error::config(format!("Invalid query parameter '{raw}', expected name=value")))
}
