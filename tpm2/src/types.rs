//! Structures, unions and buffers exchanged with the TPM.

use std::io::{Read, Write};

use mu::{Context, CustomMarshaller, Error, Marshal, Unmarshal};
use serde::Serialize;

use crate::constants::{AlgorithmId, Handle};

/// TPM2B_DIGEST
pub type Digest = Vec<u8>;
/// TPM2B_NONCE
pub type Nonce = Vec<u8>;
/// TPM2B_DATA
pub type Data = Vec<u8>;
/// TPM2B_AUTH
pub type Auth = Vec<u8>;
/// TPM2B_ENCRYPTED_SECRET
pub type EncryptedSecret = Vec<u8>;

mu::mu_struct! {
    /// TPMS_CLOCK_INFO
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
    pub struct ClockInfo {
        /// Milliseconds the TPM has been powered since it was last cleared.
        pub clock: u64,
        pub reset_count: u32,
        pub restart_count: u32,
        /// Whether `clock` is guaranteed not to have gone backwards.
        pub safe: bool,
    }
}

mu::mu_struct! {
    /// TPMS_TIME_INFO, the response parameter of TPM2_ReadClock.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
    pub struct TimeInfo {
        /// Milliseconds since the last power-on reset.
        pub time: u64,
        pub clock_info: ClockInfo,
    }
}

mu::mu_union! {
    /// TPMU_SYM_KEY_BITS
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SymKeyBits {
        /// Key size in bits of a block cipher.
        Sym(u16) = [AlgorithmId::AES, AlgorithmId::SM4, AlgorithmId::CAMELLIA],
        /// Hash algorithm used by the XOR obfuscation.
        Xor(AlgorithmId) = [AlgorithmId::XOR],
    }
    empty Null = [AlgorithmId::NULL];
}

mu::mu_union! {
    /// TPMU_SYM_MODE
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SymMode {
        Sym(AlgorithmId) = [AlgorithmId::AES, AlgorithmId::SM4, AlgorithmId::CAMELLIA],
    }
    empty Null = [AlgorithmId::XOR, AlgorithmId::NULL];
}

mu::mu_struct! {
    /// TPMT_SYM_DEF
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct SymDef {
        pub algorithm: AlgorithmId,
        #[mu(selector = algorithm)]
        pub key_bits: SymKeyBits,
        #[mu(selector = algorithm)]
        pub mode: SymMode,
    }
}

impl SymDef {
    /// Symmetric definition selecting no algorithm.
    pub fn null() -> Self {
        SymDef {
            algorithm: AlgorithmId::NULL,
            key_bits: SymKeyBits::Null,
            mode: SymMode::Null,
        }
    }
}

/// Smallest select bitmap a TPM accepts, covering PCRs 0 to 23.
const PCR_SELECT_MIN: usize = 3;

/// TPMS_PCR_SELECT, a set of PCR indices encoded as a byte-counted bitmap.
///
/// The bitmap holds a set, so decoding yields the indices sorted and without
/// duplicates whatever order they were marshalled in. Build values with
/// [`PcrSelect::new`] to keep that form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PcrSelect(pub Vec<u32>);

impl PcrSelect {
    pub fn new(pcrs: impl IntoIterator<Item = u32>) -> Self {
        let mut pcrs: Vec<u32> = pcrs.into_iter().collect();
        pcrs.sort_unstable();
        pcrs.dedup();
        PcrSelect(pcrs)
    }
}

impl CustomMarshaller for PcrSelect {
    fn marshal_to(&self, w: &mut dyn Write) -> mu::Result<()> {
        let size = self
            .0
            .iter()
            .map(|pcr| *pcr as usize / 8 + 1)
            .max()
            .unwrap_or(0)
            .max(PCR_SELECT_MIN);
        let size_byte = u8::try_from(size).map_err(|_| Error::TooLong {
            what: "PcrSelect",
            len: size,
            max: 1,
        })?;

        let mut bitmap = vec![0u8; size];
        for pcr in &self.0 {
            bitmap[*pcr as usize / 8] |= 1 << (pcr % 8);
        }

        size_byte.marshal(w, &Context::root())?;
        w.write_all(&bitmap)
            .map_err(|e| Error::from_io(e, "PcrSelect"))
    }

    fn unmarshal_from(r: &mut dyn Read) -> mu::Result<Self> {
        let size = u8::unmarshal(r, &Context::root())?;
        let mut bitmap = vec![0u8; usize::from(size)];
        r.read_exact(&mut bitmap)
            .map_err(|e| Error::from_io(e, "PcrSelect"))?;

        let mut pcrs = Vec::new();
        for (i, octet) in bitmap.iter().enumerate() {
            for bit in 0..8 {
                if octet & (1 << bit) != 0 {
                    pcrs.push((i * 8 + bit) as u32);
                }
            }
        }
        Ok(PcrSelect(pcrs))
    }
}

mu::custom_marshaller!(PcrSelect);

mu::mu_struct! {
    /// TPMS_PCR_SELECTION
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
    pub struct PcrSelection {
        pub hash: AlgorithmId,
        pub select: PcrSelect,
    }
}

/// TPML_PCR_SELECTION
pub type PcrSelectionList = Vec<PcrSelection>;

/// TPM2B_NAME. A name is empty, a handle, or a digest prefixed with the
/// algorithm that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum Name {
    #[default]
    Empty,
    Handle(Handle),
    Digest { alg: AlgorithmId, digest: Vec<u8> },
}

/// A digest must have the length its algorithm produces. Two bytes are never
/// accepted, as a four byte name reads back as a handle.
fn check_name_digest(alg: AlgorithmId, digest: &[u8]) -> mu::Result<()> {
    let reason = match alg.digest_size() {
        Some(size) if size != digest.len() => format!(
            "{alg} digest is {} bytes, expected {size}",
            digest.len()
        ),
        None if digest.len() == 2 => {
            format!("{alg} digest of 2 bytes would encode as a handle")
        }
        _ => return Ok(()),
    };
    Err(Error::InvalidValue { ty: "Name", reason })
}

impl CustomMarshaller for Name {
    fn marshal_to(&self, w: &mut dyn Write) -> mu::Result<()> {
        let ctx = Context::root();
        match self {
            Name::Empty => 0u16.marshal(w, &ctx),
            Name::Handle(handle) => {
                4u16.marshal(w, &ctx)?;
                handle.marshal(w, &ctx)
            }
            Name::Digest { alg, digest } => {
                check_name_digest(*alg, digest)?;
                let len = digest.len() + 2;
                let size = u16::try_from(len).map_err(|_| Error::TooLong {
                    what: "Name",
                    len,
                    max: 2,
                })?;
                size.marshal(w, &ctx)?;
                alg.marshal(w, &ctx)?;
                w.write_all(digest).map_err(|e| Error::from_io(e, "Name"))
            }
        }
    }

    fn unmarshal_from(r: &mut dyn Read) -> mu::Result<Self> {
        let ctx = Context::root();
        let size = u16::unmarshal(r, &ctx)?;
        match size {
            0 => Ok(Name::Empty),
            4 => Ok(Name::Handle(Handle::unmarshal(r, &ctx)?)),
            1 => Err(Error::Truncated { what: "Name" }),
            _ => {
                let alg = AlgorithmId::unmarshal(r, &ctx)?;
                let mut digest = vec![0u8; usize::from(size) - 2];
                r.read_exact(&mut digest)
                    .map_err(|e| Error::from_io(e, "Name"))?;
                Ok(Name::Digest { alg, digest })
            }
        }
    }
}

mu::custom_marshaller!(Name);

#[cfg(test)]
mod tests {
    use mu::{Kind, marshal_to_bytes, unmarshal_from_bytes};
    use rstest::rstest;

    use super::*;
    use crate::constants::SessionType;

    #[test]
    fn test_start_auth_session_parameters() {
        let nonce_caller: Nonce = vec![0xaa; 4];
        let encrypted_salt = EncryptedSecret::new();
        let bytes = marshal_to_bytes((
            &Handle::NULL,
            &Handle::NULL,
            &nonce_caller,
            &encrypted_salt,
            &SessionType::HMAC,
            &SymDef::null(),
            &AlgorithmId::SHA256,
        ))
        .unwrap();

        assert_eq!(
            vec![
                0x40, 0x00, 0x00, 0x07, // tpmKey
                0x40, 0x00, 0x00, 0x07, // bind
                0x00, 0x04, 0xaa, 0xaa, 0xaa, 0xaa, // nonceCaller
                0x00, 0x00, // encryptedSalt
                0x00, // sessionType
                0x00, 0x10, // symmetric
                0x00, 0x0b, // authHash
            ],
            bytes
        );
    }

    #[test]
    fn test_start_auth_session_response() {
        let input = [0x02, 0x00, 0x00, 0x00, 0x00, 0x02, 0x01, 0x02];
        let mut handle = Handle::default();
        let mut nonce_tpm = Nonce::new();
        let n = unmarshal_from_bytes(&input, (&mut handle, &mut nonce_tpm)).unwrap();
        assert_eq!(Handle(0x0200_0000), handle);
        assert_eq!(vec![1, 2], nonce_tpm);
        assert_eq!(input.len(), n);
    }

    #[test]
    fn test_read_clock_time_info() {
        let input = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, // time
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, // clock
            0x00, 0x00, 0x00, 0x05, // resetCount
            0x00, 0x00, 0x00, 0x02, // restartCount
            0x01, // safe
        ];
        let info = TimeInfo::from_bytes(&input).unwrap();
        assert_eq!(
            TimeInfo {
                time: 0x1_0000,
                clock_info: ClockInfo {
                    clock: 0x1000,
                    reset_count: 5,
                    restart_count: 2,
                    safe: true,
                },
            },
            info
        );
        assert_eq!(input.to_vec(), info.to_bytes().unwrap());
    }

    #[rstest(def, expected,
        case(SymDef::null(), vec![0x00, 0x10]),
        case(
            SymDef {
                algorithm: AlgorithmId::AES,
                key_bits: SymKeyBits::Sym(128),
                mode: SymMode::Sym(AlgorithmId::CFB),
            },
            vec![0x00, 0x06, 0x00, 0x80, 0x00, 0x43],
        ),
        case(
            SymDef {
                algorithm: AlgorithmId::XOR,
                key_bits: SymKeyBits::Xor(AlgorithmId::SHA256),
                mode: SymMode::Null,
            },
            vec![0x00, 0x0a, 0x00, 0x0b],
        ),
    )]
    fn test_sym_def(def: SymDef, expected: Vec<u8>) {
        let bytes = def.to_bytes().unwrap();
        assert_eq!(expected, bytes);
        assert_eq!(def, SymDef::from_bytes(&bytes).unwrap());
    }

    #[test]
    fn test_sym_def_unknown_algorithm() {
        let err = SymDef::from_bytes(&[0x00, 0x0b, 0x00, 0x00]).unwrap_err();
        assert!(matches!(
            err.root(),
            Error::InvalidSelector {
                ty: "SymKeyBits",
                value: 0x0b
            }
        ));
    }

    #[rstest(select, expected,
        case(PcrSelect(vec![]), vec![0x03, 0x00, 0x00, 0x00]),
        case(PcrSelect(vec![0, 7, 16]), vec![0x03, 0x81, 0x00, 0x01]),
        case(PcrSelect(vec![31]), vec![0x04, 0x00, 0x00, 0x00, 0x80]),
    )]
    fn test_pcr_select(select: PcrSelect, expected: Vec<u8>) {
        let bytes = select.to_bytes().unwrap();
        assert_eq!(expected, bytes);
        assert_eq!(select, PcrSelect::from_bytes(&bytes).unwrap());
    }

    #[test]
    fn test_pcr_select_is_a_set() {
        let select = PcrSelect::new([16, 0, 7, 0]);
        assert_eq!(PcrSelect(vec![0, 7, 16]), select);

        let unsorted = PcrSelect(vec![16, 0, 7, 0]);
        let bytes = unsorted.to_bytes().unwrap();
        assert_eq!(select.to_bytes().unwrap(), bytes);
        assert_eq!(select, PcrSelect::from_bytes(&bytes).unwrap());
    }

    #[test]
    fn test_pcr_selection_list() {
        let list: PcrSelectionList = vec![
            PcrSelection {
                hash: AlgorithmId::SHA1,
                select: PcrSelect(vec![1]),
            },
            PcrSelection {
                hash: AlgorithmId::SHA256,
                select: PcrSelect(vec![8, 23]),
            },
        ];
        let bytes = list.to_bytes().unwrap();
        assert_eq!(
            vec![
                0x00, 0x00, 0x00, 0x02, //
                0x00, 0x04, 0x03, 0x02, 0x00, 0x00, //
                0x00, 0x0b, 0x03, 0x00, 0x01, 0x80,
            ],
            bytes
        );
        assert_eq!(list, PcrSelectionList::from_bytes(&bytes).unwrap());
    }

    #[rstest(name, expected,
        case(Name::Empty, vec![0x00, 0x00]),
        case(Name::Handle(Handle::OWNER), vec![0x00, 0x04, 0x40, 0x00, 0x00, 0x01]),
        case(
            Name::Digest { alg: AlgorithmId::SHA1, digest: vec![0xab; 20] },
            [vec![0x00, 0x16, 0x00, 0x04], vec![0xab; 20]].concat(),
        ),
        case(
            Name::Digest { alg: AlgorithmId(0x7fff), digest: vec![1, 2, 3] },
            vec![0x00, 0x05, 0x7f, 0xff, 0x01, 0x02, 0x03],
        ),
    )]
    fn test_name_marshal(name: Name, expected: Vec<u8>) {
        assert_eq!(Kind::Custom, Name::KIND);
        assert_eq!(expected, name.to_bytes().unwrap());
        assert_eq!(name, Name::from_bytes(&expected).unwrap());
    }

    #[rstest(alg, digest,
        case(AlgorithmId::SHA1, vec![0xde, 0xad]),
        case(AlgorithmId::SHA256, vec![1, 2, 3]),
        case(AlgorithmId(0x7fff), vec![0xde, 0xad]),
    )]
    fn test_name_marshal_rejects_digest_length(alg: AlgorithmId, digest: Vec<u8>) {
        let err = Name::Digest { alg, digest }.to_bytes().unwrap_err();
        assert!(matches!(err, Error::Custom { ty: "Name", .. }));
        assert!(matches!(err.root(), Error::InvalidValue { ty: "Name", .. }));
    }

    #[test]
    fn test_name_unmarshal() {
        // A four byte name is always read back as a handle.
        let name = Name::from_bytes(&[0x00, 0x04, 0x40, 0x00, 0x00, 0x01]).unwrap();
        assert_eq!(Name::Handle(Handle::OWNER), name);

        let name = Name::from_bytes(&[0x00, 0x05, 0x00, 0x0b, 0x01, 0x02, 0x03]).unwrap();
        assert_eq!(
            Name::Digest {
                alg: AlgorithmId::SHA256,
                digest: vec![1, 2, 3]
            },
            name
        );

        let err = Name::from_bytes(&[0x00, 0x08, 0x00, 0x0b, 0x01]).unwrap_err();
        assert!(matches!(err, Error::Custom { ty: "Name", .. }));
        assert!(matches!(err.root(), Error::Truncated { what: "Name" }));
    }
}
