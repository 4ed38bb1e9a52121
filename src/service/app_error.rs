// Copyright 2025 servkit contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// Malformed or out-of-bounds length prefix, illegal extension-octet
    /// count, or an illegal top bit in a 4-octet extension.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// The requested frame exceeds the representable maximum. Raised at
    /// build time, before any bytes are queued.
    #[error("frame of {0} bytes exceeds the encodable maximum")]
    EncodingOverflow(usize),

    #[error("config file error: {0}")]
    ConfigFileError(#[from] config::ConfigError),
}
