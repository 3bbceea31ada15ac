use console::style;
use cropwatch_core::{CropwatchError, ErrorKind};
use std::fmt;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), context: None, suggestions: Vec::new(), help_command: None }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for an analysis service that does not answer its health check
pub fn service_unreachable(base_url: &str, error: &CropwatchError) -> CliError {
    CliError::new("Cannot reach the analysis service")
        .with_context(format!("Service URL: {}\n\nError: {}", base_url, error))
        .with_suggestion("Check that the backend is running")
        .with_suggestion("Point at another instance: --api-url http://host:8000")
        .with_suggestion("Or set CROPWATCH_API_URL")
        .with_help("Run: cropwatch config")
}

/// Create error for an unreadable AOI file
pub fn aoi_unreadable(path: &str, reason: &str) -> CliError {
    CliError::new("Cannot read area of interest")
        .with_context(format!("Path: {}\n\nReason: {}", path, reason))
        .with_suggestion("Provide a GeoJSON Polygon geometry or a Feature wrapping one")
        .with_suggestion("Coordinates must be [longitude, latitude] in WGS 84")
        .with_help("Run: cropwatch analyze --help")
}

/// Convert a domain error into a CliError with suggestions for its kind
pub fn from_cropwatch(error: &CropwatchError) -> CliError {
    match error.kind() {
        ErrorKind::Validation => CliError::new(error.user_message())
            .with_suggestion("Dates use the YYYY-MM-DD format, e.g. --start 2024-01-01 --end 2024-06-01")
            .with_help("Run: cropwatch analyze --help"),
        ErrorKind::Network => CliError::new(error.user_message())
            .with_context(format!("Error: {}", error))
            .with_suggestion("Retry the command")
            .with_help("Run: cropwatch config"),
        ErrorKind::NoResults => CliError::new(error.user_message())
            .with_suggestion("Check the spelling or try a larger place (region or country)"),
        ErrorKind::RemoteJob => CliError::new(error.user_message())
            .with_suggestion("Submit a new analysis, possibly with a wider date range")
            .with_help("Run: cropwatch analyze --help"),
        ErrorKind::Internal => CliError::new(error.to_string()),
    }
}
