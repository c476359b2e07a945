// tools.rs - Catalogue of supported OSINT tool integrations
// Each tool is a closed enum variant mapped to a static ToolSpec record.
// Adding a tool means adding a variant and a record, nothing else.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder substituted with the query value in argument templates
pub const QUERY_PLACEHOLDER: &str = "{query}";

const SOCIAL_ANALYZER_WEBSITES: &str = "facebook instagram twitter linkedin youtube tumblr quora snapchat telegram pinterest whatsapp reddit github gitlab medium tiktok vimeo dailymotion soundcloud spotify clubhouse discord twitch slack stackoverflow wechat kakaotalk signal messenger";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolId {
    Instagram,
    Maigret,
    Sherlock,
    Holehe,
    Whois,
    SocialAnalyzer,
    Exif,
}

impl ToolId {
    pub const ALL: [ToolId; 7] = [
        ToolId::Instagram,
        ToolId::Maigret,
        ToolId::Sherlock,
        ToolId::Holehe,
        ToolId::Whois,
        ToolId::SocialAnalyzer,
        ToolId::Exif,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::Instagram => "instagram",
            ToolId::Maigret => "maigret",
            ToolId::Sherlock => "sherlock",
            ToolId::Holehe => "holehe",
            ToolId::Whois => "whois",
            ToolId::SocialAnalyzer => "social-analyzer",
            ToolId::Exif => "exif",
        }
    }

    pub fn spec(&self) -> &'static ToolSpec {
        match self {
            ToolId::Instagram => &INSTAGRAM,
            ToolId::Maigret => &MAIGRET,
            ToolId::Sherlock => &SHERLOCK,
            ToolId::Holehe => &HOLEHE,
            ToolId::Whois => &WHOIS,
            ToolId::SocialAnalyzer => &SOCIAL_ANALYZER,
            ToolId::Exif => &EXIF,
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace('_', "-");
        ToolId::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| {
                let known: Vec<&str> = ToolId::ALL.iter().map(|t| t.as_str()).collect();
                format!("Unknown tool '{}'. Available: {}", s, known.join(", "))
            })
    }
}

/// What kind of input the tool's form collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Username,
    Email,
    Domain,
    Image,
}

/// How the adapter reaches the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// External executable with an argument template
    Process {
        program: &'static str,
        args: &'static [&'static str],
    },
    /// In-process library call
    Library(LibraryCall),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryCall {
    Profile,
    Whois,
    ImageMetadata,
}

/// Whether the tool is expected to print JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Json,
    Text,
}

/// Exit status handling for process tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Exit status is not part of the result
    Ignore,
    /// Non-zero exit with output is an error carrying stderr
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupPolicy {
    None,
    /// Remove `{query}*.txt` from the working directory
    QueryReports,
}

/// User-visible texts for one tool
#[derive(Debug, Clone, Copy)]
pub struct ToolMessages {
    pub header: &'static str,
    pub prompt: &'static str,
    pub button: &'static str,
    pub running: &'static str,
    pub missing_input: &'static str,
    pub success: &'static str,
    pub empty: &'static str,
    pub error_prefix: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub id: ToolId,
    pub label: &'static str,
    pub input: InputKind,
    pub backend: Backend,
    pub output: OutputFormat,
    pub exit_policy: ExitPolicy,
    pub cleanup: CleanupPolicy,
    pub messages: ToolMessages,
}

impl ToolSpec {
    pub fn is_process(&self) -> bool {
        matches!(self.backend, Backend::Process { .. })
    }

    /// Build the argument vector for a process tool.
    /// `extra_args` come from configuration and are appended verbatim.
    pub fn build_args(&self, query: &str, extra_args: &[String]) -> Vec<String> {
        let template: &[&str] = match self.backend {
            Backend::Process { args, .. } => args,
            Backend::Library(_) => &[],
        };

        template
            .iter()
            .map(|arg| arg.replace(QUERY_PLACEHOLDER, query))
            .chain(extra_args.iter().cloned())
            .collect()
    }

    pub fn default_program(&self) -> Option<&'static str> {
        match self.backend {
            Backend::Process { program, .. } => Some(program),
            Backend::Library(_) => None,
        }
    }
}

static INSTAGRAM: ToolSpec = ToolSpec {
    id: ToolId::Instagram,
    label: "Instagram Profile Info",
    input: InputKind::Username,
    backend: Backend::Library(LibraryCall::Profile),
    output: OutputFormat::Json,
    exit_policy: ExitPolicy::Ignore,
    cleanup: CleanupPolicy::None,
    messages: ToolMessages {
        header: "Instagram Profile Details",
        prompt: "Enter Instagram username:",
        button: "Get Profile Details",
        running: "Fetching profile data...",
        missing_input: "Please enter an Instagram username.",
        success: "Profile data fetched successfully",
        empty: "No profile data returned.",
        error_prefix: "Error fetching profile or posts",
    },
};

static MAIGRET: ToolSpec = ToolSpec {
    id: ToolId::Maigret,
    label: "Username Check 1",
    input: InputKind::Username,
    backend: Backend::Process {
        program: "maigret",
        args: &[QUERY_PLACEHOLDER],
    },
    output: OutputFormat::Json,
    exit_policy: ExitPolicy::Ignore,
    cleanup: CleanupPolicy::None,
    messages: ToolMessages {
        header: "Username Intelligence across websites",
        prompt: "Enter username to check across platforms:",
        button: "Run scan",
        running: "Running scan... this may take a while",
        missing_input: "Please enter a username",
        success: "Results fetched successfully",
        empty: "No output.",
        error_prefix: "Error running scan",
    },
};

static SHERLOCK: ToolSpec = ToolSpec {
    id: ToolId::Sherlock,
    label: "Username Check 2",
    input: InputKind::Username,
    backend: Backend::Process {
        program: "sherlock",
        args: &[QUERY_PLACEHOLDER, "--no-color", "--print-found"],
    },
    output: OutputFormat::Text,
    exit_policy: ExitPolicy::Ignore,
    cleanup: CleanupPolicy::QueryReports,
    messages: ToolMessages {
        header: "Username Intelligence",
        prompt: "Enter username to check across platforms:",
        button: "Run scan",
        running: "Running scan...",
        missing_input: "Please enter a username",
        success: "Results fetched successfully",
        empty: "No accounts found.",
        error_prefix: "Error running scan",
    },
};

static HOLEHE: ToolSpec = ToolSpec {
    id: ToolId::Holehe,
    label: "Email Lookup",
    input: InputKind::Email,
    backend: Backend::Process {
        program: "holehe",
        args: &[QUERY_PLACEHOLDER],
    },
    output: OutputFormat::Text,
    exit_policy: ExitPolicy::Ignore,
    cleanup: CleanupPolicy::None,
    messages: ToolMessages {
        header: "Email Intelligence",
        prompt: "Enter email address:",
        button: "Run Scan",
        running: "Checking email...",
        missing_input: "Please enter an email address",
        success: "Results fetched successfully",
        empty: "No results.",
        error_prefix: "Error running scan",
    },
};

static WHOIS: ToolSpec = ToolSpec {
    id: ToolId::Whois,
    label: "Domain Details",
    input: InputKind::Domain,
    backend: Backend::Library(LibraryCall::Whois),
    output: OutputFormat::Json,
    exit_policy: ExitPolicy::Ignore,
    cleanup: CleanupPolicy::None,
    messages: ToolMessages {
        header: "Domain Lookup",
        prompt: "Enter domain (e.g., example.com):",
        button: "Run Whois",
        running: "Querying Whois database...",
        missing_input: "Please enter a domain.",
        success: "Whois data fetched successfully",
        empty: "No registration data returned.",
        error_prefix: "Error",
    },
};

static SOCIAL_ANALYZER: ToolSpec = ToolSpec {
    id: ToolId::SocialAnalyzer,
    label: "Social Media",
    input: InputKind::Username,
    backend: Backend::Process {
        program: "python3",
        args: &[
            "-m",
            "social-analyzer",
            "--username",
            QUERY_PLACEHOLDER,
            "--mode",
            "fast",
            "--websites",
            SOCIAL_ANALYZER_WEBSITES,
        ],
    },
    output: OutputFormat::Text,
    exit_policy: ExitPolicy::Strict,
    cleanup: CleanupPolicy::None,
    messages: ToolMessages {
        header: "Social Analyzer",
        prompt: "Enter a username to analyze:",
        button: "Run Social Analyzer",
        running: "Running Social Analyzer... This may take a moment.",
        missing_input: "Please enter a username.",
        success: "Analysis complete. Results:",
        empty: "No profiles found for this username.",
        error_prefix: "Social Analyzer exited with an error. Check the input.",
    },
};

static EXIF: ToolSpec = ToolSpec {
    id: ToolId::Exif,
    label: "Image Metadata",
    input: InputKind::Image,
    backend: Backend::Library(LibraryCall::ImageMetadata),
    output: OutputFormat::Json,
    exit_policy: ExitPolicy::Ignore,
    cleanup: CleanupPolicy::None,
    messages: ToolMessages {
        header: "Image EXIF Metadata",
        prompt: "Upload an image or enter an image URL:",
        button: "Extract Metadata",
        running: "Reading image metadata...",
        missing_input: "Please upload an image or enter an image URL.",
        success: "Metadata extracted successfully",
        empty: "No EXIF metadata found.",
        error_prefix: "Error reading image",
    },
};
