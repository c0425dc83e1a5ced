// Copyright 2024 Cosmian Tech SAS
// Changes made to the original code are
// licensed under the Business Source License version 1.1.
//
//Original code:
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

use std::fmt;

use bitflags::bitflags;
use pkcs11_sys::{
    CK_FLAGS, CK_MECHANISM_INFO, CK_MECHANISM_TYPE, CK_ULONG, CKF_DECRYPT, CKF_DERIVE,
    CKF_DIGEST, CKF_ENCRYPT, CKF_GENERATE, CKF_GENERATE_KEY_PAIR, CKF_HW, CKF_SIGN,
    CKF_SIGN_RECOVER, CKF_UNWRAP, CKF_VERIFY, CKF_VERIFY_RECOVER, CKF_WRAP, CKM_AES_CBC,
    CKM_AES_CBC_PAD, CKM_AES_CTR, CKM_AES_ECB, CKM_AES_GCM, CKM_AES_KEY_GEN, CKM_EC_KEY_PAIR_GEN,
    CKM_ECDSA, CKM_ECDSA_SHA1, CKM_ECDSA_SHA256, CKM_RSA_PKCS, CKM_RSA_PKCS_KEY_PAIR_GEN,
    CKM_RSA_PKCS_OAEP, CKM_RSA_PKCS_PSS, CKM_RSA_X_509, CKM_SHA_1, CKM_SHA1_RSA_PKCS, CKM_SHA256,
    CKM_SHA256_RSA_PKCS, CKM_SHA256_RSA_PKCS_PSS, CKM_SHA384, CKM_SHA384_RSA_PKCS, CKM_SHA512,
    CKM_SHA512_RSA_PKCS,
};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// A PKCS#11 mechanism type code.
///
/// The layout is the one of `CK_MECHANISM_TYPE` so that a caller supplied
/// `CK_MECHANISM_TYPE` array can be viewed as a `[MechanismType]`.
#[repr(transparent)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MechanismType(CK_MECHANISM_TYPE);

impl MechanismType {
    #[must_use]
    pub const fn new(mechanism: CK_MECHANISM_TYPE) -> Self {
        Self(mechanism)
    }

    #[must_use]
    pub const fn value(self) -> CK_MECHANISM_TYPE {
        self.0
    }
}

impl From<CK_MECHANISM_TYPE> for MechanismType {
    fn from(mechanism: CK_MECHANISM_TYPE) -> Self {
        Self(mechanism)
    }
}

impl From<MechanismType> for CK_MECHANISM_TYPE {
    fn from(mechanism: MechanismType) -> Self {
        mechanism.0
    }
}

impl fmt::Display for MechanismType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match KnownMechanism::from_type(*self) {
            Some(known) => write!(f, "{known}"),
            None => write!(f, "{:#x}", self.0),
        }
    }
}

bitflags! {
    /// The `CKF_*` bits of a `CK_MECHANISM_INFO`.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MechanismFlags: CK_FLAGS {
        const HW = CKF_HW;
        const ENCRYPT = CKF_ENCRYPT;
        const DECRYPT = CKF_DECRYPT;
        const DIGEST = CKF_DIGEST;
        const SIGN = CKF_SIGN;
        const SIGN_RECOVER = CKF_SIGN_RECOVER;
        const VERIFY = CKF_VERIFY;
        const VERIFY_RECOVER = CKF_VERIFY_RECOVER;
        const GENERATE = CKF_GENERATE;
        const GENERATE_KEY_PAIR = CKF_GENERATE_KEY_PAIR;
        const WRAP = CKF_WRAP;
        const UNWRAP = CKF_UNWRAP;
        const DERIVE = CKF_DERIVE;
    }
}

/// Operating limits of a mechanism on a slot.
///
/// Key sizes are expressed in bits. Digest mechanisms, which take no key,
/// report `0..=0`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MechanismCapability {
    pub min_key_size: CK_ULONG,
    pub max_key_size: CK_ULONG,
    pub flags: MechanismFlags,
}

impl MechanismCapability {
    #[must_use]
    pub const fn new(min_key_size: CK_ULONG, max_key_size: CK_ULONG, flags: MechanismFlags) -> Self {
        Self {
            min_key_size,
            max_key_size,
            flags,
        }
    }
}

impl From<MechanismCapability> for CK_MECHANISM_INFO {
    fn from(capability: MechanismCapability) -> Self {
        Self {
            ulMinKeySize: capability.min_key_size,
            ulMaxKeySize: capability.max_key_size,
            flags: capability.flags.bits(),
        }
    }
}

/// Mechanisms advertised by the default token.
///
/// The declaration order is the order in which `C_GetMechanismList` returns them.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownMechanism {
    #[strum(serialize = "CKM_AES_KEY_GEN")]
    AesKeyGen,
    #[strum(serialize = "CKM_AES_ECB")]
    AesEcb,
    #[strum(serialize = "CKM_AES_CBC")]
    AesCbc,
    #[strum(serialize = "CKM_AES_CBC_PAD")]
    AesCbcPad,
    #[strum(serialize = "CKM_AES_CTR")]
    AesCtr,
    #[strum(serialize = "CKM_AES_GCM")]
    AesGcm,
    #[strum(serialize = "CKM_RSA_PKCS_KEY_PAIR_GEN")]
    RsaPkcsKeyPairGen,
    #[strum(serialize = "CKM_RSA_X_509")]
    RsaX509,
    #[strum(serialize = "CKM_RSA_PKCS")]
    RsaPkcs,
    #[strum(serialize = "CKM_RSA_PKCS_OAEP")]
    RsaPkcsOaep,
    #[strum(serialize = "CKM_RSA_PKCS_PSS")]
    RsaPkcsPss,
    #[strum(serialize = "CKM_SHA1_RSA_PKCS")]
    RsaPkcsSha1,
    #[strum(serialize = "CKM_SHA256_RSA_PKCS")]
    RsaPkcsSha256,
    #[strum(serialize = "CKM_SHA384_RSA_PKCS")]
    RsaPkcsSha384,
    #[strum(serialize = "CKM_SHA512_RSA_PKCS")]
    RsaPkcsSha512,
    #[strum(serialize = "CKM_SHA256_RSA_PKCS_PSS")]
    RsaPssSha256,
    #[strum(serialize = "CKM_EC_KEY_PAIR_GEN")]
    EcKeyPairGen,
    #[strum(serialize = "CKM_ECDSA")]
    Ecdsa,
    #[strum(serialize = "CKM_ECDSA_SHA1")]
    EcdsaSha1,
    #[strum(serialize = "CKM_ECDSA_SHA256")]
    EcdsaSha256,
    #[strum(serialize = "CKM_SHA_1")]
    Sha1,
    #[strum(serialize = "CKM_SHA256")]
    Sha256,
    #[strum(serialize = "CKM_SHA384")]
    Sha384,
    #[strum(serialize = "CKM_SHA512")]
    Sha512,
}

const AES_KEY_BITS: (CK_ULONG, CK_ULONG) = (128, 512);
const RSA_KEY_BITS: (CK_ULONG, CK_ULONG) = (1024, 4096);
const EC_KEY_BITS: (CK_ULONG, CK_ULONG) = (256, 384);

impl KnownMechanism {
    #[must_use]
    pub const fn mechanism_type(self) -> MechanismType {
        MechanismType(match self {
            Self::AesKeyGen => CKM_AES_KEY_GEN,
            Self::AesEcb => CKM_AES_ECB,
            Self::AesCbc => CKM_AES_CBC,
            Self::AesCbcPad => CKM_AES_CBC_PAD,
            Self::AesCtr => CKM_AES_CTR,
            Self::AesGcm => CKM_AES_GCM,
            Self::RsaPkcsKeyPairGen => CKM_RSA_PKCS_KEY_PAIR_GEN,
            Self::RsaX509 => CKM_RSA_X_509,
            Self::RsaPkcs => CKM_RSA_PKCS,
            Self::RsaPkcsOaep => CKM_RSA_PKCS_OAEP,
            Self::RsaPkcsPss => CKM_RSA_PKCS_PSS,
            Self::RsaPkcsSha1 => CKM_SHA1_RSA_PKCS,
            Self::RsaPkcsSha256 => CKM_SHA256_RSA_PKCS,
            Self::RsaPkcsSha384 => CKM_SHA384_RSA_PKCS,
            Self::RsaPkcsSha512 => CKM_SHA512_RSA_PKCS,
            Self::RsaPssSha256 => CKM_SHA256_RSA_PKCS_PSS,
            Self::EcKeyPairGen => CKM_EC_KEY_PAIR_GEN,
            Self::Ecdsa => CKM_ECDSA,
            Self::EcdsaSha1 => CKM_ECDSA_SHA1,
            Self::EcdsaSha256 => CKM_ECDSA_SHA256,
            Self::Sha1 => CKM_SHA_1,
            Self::Sha256 => CKM_SHA256,
            Self::Sha384 => CKM_SHA384,
            Self::Sha512 => CKM_SHA512,
        })
    }

    /// Limits of this mechanism on the default token.
    ///
    /// `CKM_AES_KEY_GEN` reports an empty flag set.
    #[must_use]
    pub const fn default_capability(self) -> MechanismCapability {
        let cipher = MechanismFlags::ENCRYPT.union(MechanismFlags::DECRYPT);
        let signature = MechanismFlags::SIGN.union(MechanismFlags::VERIFY);
        let ((min, max), flags) = match self {
            Self::AesKeyGen => (AES_KEY_BITS, MechanismFlags::empty()),
            Self::AesEcb | Self::AesCbc | Self::AesCbcPad | Self::AesCtr | Self::AesGcm => {
                (AES_KEY_BITS, cipher)
            }
            Self::RsaPkcsKeyPairGen => (RSA_KEY_BITS, MechanismFlags::GENERATE_KEY_PAIR),
            Self::RsaX509 | Self::RsaPkcs => (RSA_KEY_BITS, cipher.union(signature)),
            Self::RsaPkcsOaep => (RSA_KEY_BITS, cipher),
            Self::RsaPkcsPss
            | Self::RsaPkcsSha1
            | Self::RsaPkcsSha256
            | Self::RsaPkcsSha384
            | Self::RsaPkcsSha512
            | Self::RsaPssSha256 => (RSA_KEY_BITS, signature),
            Self::EcKeyPairGen => (EC_KEY_BITS, MechanismFlags::GENERATE_KEY_PAIR),
            Self::Ecdsa | Self::EcdsaSha1 | Self::EcdsaSha256 => (EC_KEY_BITS, signature),
            Self::Sha1 | Self::Sha256 | Self::Sha384 | Self::Sha512 => {
                ((0, 0), MechanismFlags::DIGEST)
            }
        };
        MechanismCapability::new(min, max, flags)
    }

    #[must_use]
    pub fn from_type(mechanism: MechanismType) -> Option<Self> {
        Self::iter().find(|known| known.mechanism_type() == mechanism)
    }
}
