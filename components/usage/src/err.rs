// Copyright 2024 diskbar
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("request to {url} failed"))]
    Request {
        url:      String,
        #[snafu(implicit)]
        location: Location,
        source:   reqwest::Error,
    },

    #[snafu(display("{url} answered with status {status}"))]
    BadStatus {
        url:      String,
        status:   u16,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("body of {url} is not valid json"))]
    MalformedBody {
        url:      String,
        #[snafu(implicit)]
        location: Location,
        source:   serde_json::Error,
    },

    #[snafu(display("failed to build http client"))]
    BuildClient {
        #[snafu(implicit)]
        location: Location,
        source:   reqwest::Error,
    },

    #[snafu(display("invalid url {url:?}"))]
    InvalidUrl {
        url:      String,
        #[snafu(implicit)]
        location: Location,
        source:   url::ParseError,
    },

    #[snafu(display("invalid config: {reason}"))]
    InvalidConfig {
        reason:   String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to read config file {path}"))]
    ReadConfig {
        path:     String,
        #[snafu(implicit)]
        location: Location,
        source:   std::io::Error,
    },

    #[snafu(display("failed to parse config file {path}"))]
    ParseConfig {
        path:     String,
        #[snafu(implicit)]
        location: Location,
        source:   toml::de::Error,
    },
}

/// Coarse classification of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport error or non-2xx status.
    NetworkFailure,
    /// The body could not be parsed.
    MalformedResponse,
    /// Construction-time problems: urls, config, the client itself.
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Request { .. } | Error::BadStatus { .. } => ErrorKind::NetworkFailure,
            Error::MalformedBody { .. } => ErrorKind::MalformedResponse,
            Error::BuildClient { .. }
            | Error::InvalidUrl { .. }
            | Error::InvalidConfig { .. }
            | Error::ReadConfig { .. }
            | Error::ParseConfig { .. } => ErrorKind::Config,
        }
    }
}
