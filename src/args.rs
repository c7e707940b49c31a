use clap::{Parser, Subcommand, ValueEnum};
use clap_stdin::MaybeStdin;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, clap::Args)]
pub struct Globals {
    /// The endpoint url that receives the inference requests.
    #[clap(long, env = "F_URL", global = true)]
    pub url: Option<String>,

    /// The request format the endpoint understands.
    #[clap(long, env = "F_STYLE", value_enum, global = true)]
    pub style: Option<Style>,

    /// The api key to send as a bearer token (will override the value of the environment
    /// variable.)
    #[clap(long, env = "F_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// The environment variable to use to get the api key.
    #[clap(long, env = "F_API_ENV", global = true)]
    pub api_env: Option<String>,

    /// Add a system message at the start of the conversation.
    #[clap(long, env = "F_SYSTEM", global = true)]
    pub system: Option<String>,

    /// The maximum amount of tokens to generate.
    #[clap(long, env = "F_MAX_TOKENS", global = true)]
    pub max_tokens: Option<u32>,

    /// Temperature value.
    #[clap(long, env = "F_TEMPERATURE", global = true)]
    pub temperature: Option<f32>,

    /// Top-P value.
    #[clap(long, env = "F_TOP_P", global = true)]
    pub top_p: Option<f32>,

    /// Stop sequences for text completion endpoints.
    #[clap(long, global = true)]
    pub stop: Option<Vec<String>>,

    /// Request timeout in seconds.
    #[clap(long, env = "F_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Config file
    #[clap(
        long,
        env = "F_CONFIG_FILE",
        default_value = "~/.config/f.toml",
        global = true
    )]
    pub config_file: String,

    /// Preset configuration
    #[clap(long, env = "F_PRESET", global = true)]
    pub preset: Option<String>,

    /// Don't run the spinner
    #[clap(long, env = "F_QUIET", global = true)]
    pub quiet: Option<bool>,

    /// Render replies as markdown.
    #[clap(long, env = "F_PRETTY", global = true)]
    pub pretty: Option<bool>,
}

/// How requests are encoded for the endpoint.
#[derive(ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// `{"messages": [..]}` chat completion requests.
    #[default]
    Chat,
    /// `{"inputs": ".."}` requests with the conversation rendered through a chat template.
    Text,
    /// `{"inputs": ".."}` requests with the latest user message sent verbatim.
    Raw,
}

#[derive(Default, ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[clap(rename_all = "kebab-case")]
pub enum Output {
    #[default]
    /// Plain text
    Raw,
    /// JSON
    Json,
    /// YAML
    Yaml,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start an interactive chat. Type `quit` or `exit` to leave.
    #[clap(alias = "c")]
    Chat,
    /// Send a single prompt and print the reply.
    #[clap(alias = "i")]
    Invoke {
        /// The user message prompt. Use `-` to read it from stdin.
        prompt: MaybeStdin<String>,
        /// Response output format
        #[clap(short, long, value_enum, default_value = "raw")]
        format: Output,
    },
}

#[derive(Debug, Parser)]
#[command(name = "f")]
#[command(about = "Chat with deployed model inference endpoints through the terminal")]
pub struct Args {
    #[clap(flatten)]
    pub globals: Globals,

    #[command(subcommand)]
    pub command: Commands,
}
