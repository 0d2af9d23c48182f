/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

use thiserror::Error;
use eos_common::store::StoreError;

pub type Result<T> = std::result::Result<T, EosAgriError>;

#[derive(Error,Debug)]
pub enum EosAgriError {

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("object store error {0}")]
    StoreError( #[from] StoreError),

    #[error("CSV error {0}")]
    CsvError( #[from] csv::Error),

    #[error("JSON error {0}")]
    JsonError( #[from] serde_json::Error),

    #[error("config error {0}")]
    ConfigError( #[from] ron::error::SpannedError),

    #[error("worker task failed {0}")]
    JoinError( #[from] tokio::task::JoinError),

    #[error("deadline exceeded: {0}")]
    DeadlineExceeded( String ),

    #[error("not found: {0}")]
    NotFound( String ),

    #[error("invalid request: {0}")]
    InvalidRequest( String ),

    #[error("operation failed {0}")]
    OpFailedError(String),
}

impl EosAgriError {
    /// true for errors that are caused by the caller and should be reported as 4xx
    pub fn is_client_error (&self)->bool {
        matches!( self, EosAgriError::NotFound(_) | EosAgriError::InvalidRequest(_) | EosAgriError::StoreError(StoreError::NotFound(_)))
    }
}

macro_rules! op_failed {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::EosAgriError::OpFailedError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use op_failed;

macro_rules! invalid_request {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::EosAgriError::InvalidRequest( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use invalid_request;
