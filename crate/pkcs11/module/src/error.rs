// Copyright 2024 Cosmian Tech SAS
// Changes made to the original code are
// licensed under the Business Source License version 1.1.
//
// Original code:
// Copyright 2022 Google LLC
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

use pkcs11_sys::{
    CK_MECHANISM_TYPE, CK_RV, CK_SLOT_ID, CKR_ARGUMENTS_BAD, CKR_BUFFER_TOO_SMALL,
    CKR_CRYPTOKI_ALREADY_INITIALIZED, CKR_CRYPTOKI_NOT_INITIALIZED, CKR_GENERAL_ERROR,
    CKR_MECHANISM_INVALID, CKR_SLOT_ID_INVALID,
};
use thiserror::Error;

pub type MResult<T> = Result<T, MError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MError {
    // Errors returned to the PKCS#11 caller
    #[error("bad arguments")]
    ArgumentsBad,

    #[error("buffer too small: {required} elements required")]
    BufferTooSmall { required: usize },

    #[error("mechanism {0:#x} is invalid")]
    MechanismInvalid(CK_MECHANISM_TYPE),

    #[error("slot id {0} is invalid")]
    SlotIdInvalid(CK_SLOT_ID),

    // Module lifecycle
    #[error("cryptoki is not initialized")]
    CryptokiNotInitialized,

    #[error("cryptoki is already initialized")]
    CryptokiAlreadyInitialized,

    // Provider set-up errors
    #[error("invalid mechanism table: {0}")]
    InvalidMechanismTable(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<MError> for CK_RV {
    fn from(e: MError) -> Self {
        match e {
            MError::ArgumentsBad => CKR_ARGUMENTS_BAD,
            MError::BufferTooSmall { .. } => CKR_BUFFER_TOO_SMALL,
            MError::MechanismInvalid(_) => CKR_MECHANISM_INVALID,
            MError::SlotIdInvalid(_) => CKR_SLOT_ID_INVALID,
            MError::CryptokiNotInitialized => CKR_CRYPTOKI_NOT_INITIALIZED,
            MError::CryptokiAlreadyInitialized => CKR_CRYPTOKI_ALREADY_INITIALIZED,
            MError::InvalidMechanismTable(_) | MError::Configuration(_) => CKR_GENERAL_ERROR,
        }
    }
}
