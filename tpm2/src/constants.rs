//! Integer vocabulary of the TPM 2.0 wire format.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

mu::mu_primitive! {
    /// Command code (TPM_CC).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct CommandCode(pub u32);

    /// Response code (TPM_RC).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ResponseCode(pub u32);

    /// Algorithm identifier (TPM_ALG_ID).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct AlgorithmId(pub u16);

    /// Structure tag (TPM_ST).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StructTag(pub u16);

    /// Handle (TPM_HANDLE).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct Handle(pub u32);

    /// Session type (TPM_SE).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SessionType(pub u8);
}

macro_rules! named_constants {
    ($ty:ident($inner:ty), $table:ident, $prefix:literal $(| $sub:literal)* { $($name:ident = $value:expr, $text:literal;)* }) => {
        impl $ty {
            $(pub const $name: $ty = $ty($value);)*
        }

        static $table: &[($inner, &str)] = &[$(($value, $text),)*];

        impl $ty {
            /// TPM name of the value, if it is a known one.
            pub fn name(&self) -> Option<&'static str> {
                $table
                    .iter()
                    .find(|(value, _)| *value == self.0)
                    .map(|(_, name)| *name)
            }

            /// Looks a value up by name, with or without the prefix. Names
            /// in a sub-range such as `RH_` may also be given without it.
            pub fn from_name(name: &str) -> Option<Self> {
                const SUB_PREFIXES: &[&str] = &[$($sub),*];
                let name = name.strip_prefix($prefix).unwrap_or(name);
                $table
                    .iter()
                    .find(|(_, n)| n.eq_ignore_ascii_case(name))
                    .or_else(|| {
                        $table.iter().find(|(_, n)| {
                            SUB_PREFIXES.iter().any(|sub| {
                                n.strip_prefix(sub)
                                    .is_some_and(|short| short.eq_ignore_ascii_case(name))
                            })
                        })
                    })
                    .map(|(value, _)| $ty(*value))
            }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.name() {
                    Some(name) => write!(f, concat!($prefix, "{}"), name),
                    None => write!(f, "{:#x}", self.0),
                }
            }
        }
    };
}

named_constants!(CommandCode(u32), COMMAND_NAMES, "TPM2_" {
    NV_UNDEFINE_SPACE_SPECIAL = 0x0000011f, "NV_UndefineSpaceSpecial";
    EVICT_CONTROL = 0x00000120, "EvictControl";
    HIERARCHY_CONTROL = 0x00000121, "HierarchyControl";
    NV_UNDEFINE_SPACE = 0x00000122, "NV_UndefineSpace";
    CHANGE_EPS = 0x00000124, "ChangeEPS";
    CHANGE_PPS = 0x00000125, "ChangePPS";
    CLEAR = 0x00000126, "Clear";
    CLEAR_CONTROL = 0x00000127, "ClearControl";
    CLOCK_SET = 0x00000128, "ClockSet";
    HIERARCHY_CHANGE_AUTH = 0x00000129, "HierarchyChangeAuth";
    NV_DEFINE_SPACE = 0x0000012a, "NV_DefineSpace";
    PCR_ALLOCATE = 0x0000012b, "PCR_Allocate";
    PCR_SET_AUTH_POLICY = 0x0000012c, "PCR_SetAuthPolicy";
    PP_COMMANDS = 0x0000012d, "PP_Commands";
    SET_PRIMARY_POLICY = 0x0000012e, "SetPrimaryPolicy";
    CLOCK_RATE_ADJUST = 0x00000130, "ClockRateAdjust";
    CREATE_PRIMARY = 0x00000131, "CreatePrimary";
    NV_GLOBAL_WRITE_LOCK = 0x00000132, "NV_GlobalWriteLock";
    GET_COMMAND_AUDIT_DIGEST = 0x00000133, "GetCommandAuditDigest";
    NV_INCREMENT = 0x00000134, "NV_Increment";
    NV_SET_BITS = 0x00000135, "NV_SetBits";
    NV_EXTEND = 0x00000136, "NV_Extend";
    NV_WRITE = 0x00000137, "NV_Write";
    NV_WRITE_LOCK = 0x00000138, "NV_WriteLock";
    DICTIONARY_ATTACK_LOCK_RESET = 0x00000139, "DictionaryAttackLockReset";
    DICTIONARY_ATTACK_PARAMETERS = 0x0000013a, "DictionaryAttackParameters";
    NV_CHANGE_AUTH = 0x0000013b, "NV_ChangeAuth";
    PCR_EVENT = 0x0000013c, "PCR_Event";
    PCR_RESET = 0x0000013d, "PCR_Reset";
    SEQUENCE_COMPLETE = 0x0000013e, "SequenceComplete";
    INCREMENTAL_SELF_TEST = 0x00000142, "IncrementalSelfTest";
    SELF_TEST = 0x00000143, "SelfTest";
    STARTUP = 0x00000144, "Startup";
    SHUTDOWN = 0x00000145, "Shutdown";
    STIR_RANDOM = 0x00000146, "StirRandom";
    ACTIVATE_CREDENTIAL = 0x00000147, "ActivateCredential";
    CERTIFY = 0x00000148, "Certify";
    POLICY_NV = 0x00000149, "PolicyNV";
    CERTIFY_CREATION = 0x0000014a, "CertifyCreation";
    DUPLICATE = 0x0000014b, "Duplicate";
    GET_TIME = 0x0000014c, "GetTime";
    GET_SESSION_AUDIT_DIGEST = 0x0000014d, "GetSessionAuditDigest";
    NV_READ = 0x0000014e, "NV_Read";
    NV_READ_LOCK = 0x0000014f, "NV_ReadLock";
    OBJECT_CHANGE_AUTH = 0x00000150, "ObjectChangeAuth";
    POLICY_SECRET = 0x00000151, "PolicySecret";
    REWRAP = 0x00000152, "Rewrap";
    CREATE = 0x00000153, "Create";
    ECDH_ZGEN = 0x00000154, "ECDH_ZGen";
    HMAC = 0x00000155, "HMAC";
    IMPORT = 0x00000156, "Import";
    LOAD = 0x00000157, "Load";
    QUOTE = 0x00000158, "Quote";
    RSA_DECRYPT = 0x00000159, "RSA_Decrypt";
    HMAC_START = 0x0000015b, "HMAC_Start";
    SEQUENCE_UPDATE = 0x0000015c, "SequenceUpdate";
    SIGN = 0x0000015d, "Sign";
    UNSEAL = 0x0000015e, "Unseal";
    POLICY_SIGNED = 0x00000160, "PolicySigned";
    CONTEXT_LOAD = 0x00000161, "ContextLoad";
    CONTEXT_SAVE = 0x00000162, "ContextSave";
    ECDH_KEY_GEN = 0x00000163, "ECDH_KeyGen";
    ENCRYPT_DECRYPT = 0x00000164, "EncryptDecrypt";
    FLUSH_CONTEXT = 0x00000165, "FlushContext";
    LOAD_EXTERNAL = 0x00000167, "LoadExternal";
    MAKE_CREDENTIAL = 0x00000168, "MakeCredential";
    NV_READ_PUBLIC = 0x00000169, "NV_ReadPublic";
    POLICY_AUTHORIZE = 0x0000016a, "PolicyAuthorize";
    POLICY_AUTH_VALUE = 0x0000016b, "PolicyAuthValue";
    POLICY_COMMAND_CODE = 0x0000016c, "PolicyCommandCode";
    POLICY_COUNTER_TIMER = 0x0000016d, "PolicyCounterTimer";
    POLICY_CP_HASH = 0x0000016e, "PolicyCpHash";
    POLICY_LOCALITY = 0x0000016f, "PolicyLocality";
    POLICY_NAME_HASH = 0x00000170, "PolicyNameHash";
    POLICY_OR = 0x00000171, "PolicyOR";
    POLICY_TICKET = 0x00000172, "PolicyTicket";
    READ_PUBLIC = 0x00000173, "ReadPublic";
    RSA_ENCRYPT = 0x00000174, "RSA_Encrypt";
    START_AUTH_SESSION = 0x00000176, "StartAuthSession";
    VERIFY_SIGNATURE = 0x00000177, "VerifySignature";
    ECC_PARAMETERS = 0x00000178, "ECC_Parameters";
    FIRMWARE_READ = 0x00000179, "FirmwareRead";
    GET_CAPABILITY = 0x0000017a, "GetCapability";
    GET_RANDOM = 0x0000017b, "GetRandom";
    GET_TEST_RESULT = 0x0000017c, "GetTestResult";
    HASH = 0x0000017d, "Hash";
    PCR_READ = 0x0000017e, "PCR_Read";
    POLICY_PCR = 0x0000017f, "PolicyPCR";
    POLICY_RESTART = 0x00000180, "PolicyRestart";
    READ_CLOCK = 0x00000181, "ReadClock";
    PCR_EXTEND = 0x00000182, "PCR_Extend";
    PCR_SET_AUTH_VALUE = 0x00000183, "PCR_SetAuthValue";
    NV_CERTIFY = 0x00000184, "NV_Certify";
    EVENT_SEQUENCE_COMPLETE = 0x00000185, "EventSequenceComplete";
    HASH_SEQUENCE_START = 0x00000186, "HashSequenceStart";
    POLICY_PHYSICAL_PRESENCE = 0x00000187, "PolicyPhysicalPresence";
    POLICY_DUPLICATION_SELECT = 0x00000188, "PolicyDuplicationSelect";
    POLICY_GET_DIGEST = 0x00000189, "PolicyGetDigest";
    TEST_PARMS = 0x0000018a, "TestParms";
    COMMIT = 0x0000018b, "Commit";
    POLICY_PASSWORD = 0x0000018c, "PolicyPassword";
    ZGEN_2PHASE = 0x0000018d, "ZGen_2Phase";
    EC_EPHEMERAL = 0x0000018e, "EC_Ephemeral";
    POLICY_NV_WRITTEN = 0x0000018f, "PolicyNvWritten";
    POLICY_TEMPLATE = 0x00000190, "PolicyTemplate";
    CREATE_LOADED = 0x00000191, "CreateLoaded";
    POLICY_AUTHORIZE_NV = 0x00000192, "PolicyAuthorizeNV";
    ENCRYPT_DECRYPT2 = 0x00000193, "EncryptDecrypt2";
});

named_constants!(AlgorithmId(u16), ALGORITHM_NAMES, "TPM_ALG_" {
    RSA = 0x0001, "RSA";
    SHA1 = 0x0004, "SHA1";
    HMAC = 0x0005, "HMAC";
    AES = 0x0006, "AES";
    MGF1 = 0x0007, "MGF1";
    KEYEDHASH = 0x0008, "KEYEDHASH";
    XOR = 0x000a, "XOR";
    SHA256 = 0x000b, "SHA256";
    SHA384 = 0x000c, "SHA384";
    SHA512 = 0x000d, "SHA512";
    NULL = 0x0010, "NULL";
    SM3_256 = 0x0012, "SM3_256";
    SM4 = 0x0013, "SM4";
    RSASSA = 0x0014, "RSASSA";
    RSAES = 0x0015, "RSAES";
    RSAPSS = 0x0016, "RSAPSS";
    OAEP = 0x0017, "OAEP";
    ECDSA = 0x0018, "ECDSA";
    ECDH = 0x0019, "ECDH";
    KDF1_SP800_108 = 0x0022, "KDF1_SP800_108";
    ECC = 0x0023, "ECC";
    SYMCIPHER = 0x0025, "SYMCIPHER";
    CAMELLIA = 0x0026, "CAMELLIA";
    CTR = 0x0040, "CTR";
    OFB = 0x0041, "OFB";
    CBC = 0x0042, "CBC";
    CFB = 0x0043, "CFB";
    ECB = 0x0044, "ECB";
});

named_constants!(StructTag(u16), STRUCT_TAG_NAMES, "TPM_ST_" {
    RSP_COMMAND = 0x00c4, "RSP_COMMAND";
    NULL = 0x8000, "NULL";
    NO_SESSIONS = 0x8001, "NO_SESSIONS";
    SESSIONS = 0x8002, "SESSIONS";
    ATTEST_NV = 0x8014, "ATTEST_NV";
    ATTEST_COMMAND_AUDIT = 0x8015, "ATTEST_COMMAND_AUDIT";
    ATTEST_SESSION_AUDIT = 0x8016, "ATTEST_SESSION_AUDIT";
    ATTEST_CERTIFY = 0x8017, "ATTEST_CERTIFY";
    ATTEST_QUOTE = 0x8018, "ATTEST_QUOTE";
    ATTEST_TIME = 0x8019, "ATTEST_TIME";
    ATTEST_CREATION = 0x801a, "ATTEST_CREATION";
    CREATION = 0x8021, "CREATION";
    VERIFIED = 0x8022, "VERIFIED";
    AUTH_SECRET = 0x8023, "AUTH_SECRET";
    HASHCHECK = 0x8024, "HASHCHECK";
    AUTH_SIGNED = 0x8025, "AUTH_SIGNED";
});

named_constants!(Handle(u32), HANDLE_NAMES, "TPM_" | "RH_" | "RS_" {
    OWNER = 0x40000001, "RH_OWNER";
    NULL = 0x40000007, "RH_NULL";
    PASSWORD = 0x40000009, "RS_PW";
    LOCKOUT = 0x4000000a, "RH_LOCKOUT";
    ENDORSEMENT = 0x4000000b, "RH_ENDORSEMENT";
    PLATFORM = 0x4000000c, "RH_PLATFORM";
    PLATFORM_NV = 0x4000000d, "RH_PLATFORM_NV";
});

named_constants!(SessionType(u8), SESSION_TYPE_NAMES, "TPM_SE_" {
    HMAC = 0x00, "HMAC";
    POLICY = 0x01, "POLICY";
    TRIAL = 0x03, "TRIAL";
});

impl ResponseCode {
    pub const SUCCESS: ResponseCode = ResponseCode(0);

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }
}

impl Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl AlgorithmId {
    /// Size in bytes of digests produced by a hash algorithm.
    pub fn digest_size(&self) -> Option<usize> {
        match *self {
            Self::SHA1 => Some(20),
            Self::SHA256 | Self::SM3_256 => Some(32),
            Self::SHA384 => Some(48),
            Self::SHA512 => Some(64),
            _ => None,
        }
    }
}

/// Range of a handle, taken from its most significant byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HandleType {
    Pcr,
    NvIndex,
    HmacSession,
    PolicySession,
    Permanent,
    Transient,
    Persistent,
    Unknown(u8),
}

impl Handle {
    pub fn handle_type(&self) -> HandleType {
        match (self.0 >> 24) as u8 {
            0x00 => HandleType::Pcr,
            0x01 => HandleType::NvIndex,
            0x02 => HandleType::HmacSession,
            0x03 => HandleType::PolicySession,
            0x40 => HandleType::Permanent,
            0x80 => HandleType::Transient,
            0x81 => HandleType::Persistent,
            n => HandleType::Unknown(n),
        }
    }
}
