use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hickory_proto::rr::rdata::NULL;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use redzone_domain::DomainError;
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, Ed25519KeyPair, KeyPair, RsaEncoding, RsaKeyPair, ECDSA_P256_SHA256_FIXED_SIGNING,
    ECDSA_P384_SHA384_FIXED_SIGNING, RSA_PKCS1_SHA256, RSA_PKCS1_SHA512,
};
use std::collections::HashMap;
use std::fmt;

const DEFAULT_DNSKEY_TTL: u32 = 3600;

/// Public half of a zone key, parsed from DNSKEY presentation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dnskey {
    pub ttl: u32,
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

impl Dnskey {
    /// Parse `owner [ttl] [class] DNSKEY flags protocol algorithm key...`.
    /// Comment lines (`;`) are skipped.
    pub fn parse(text: &str) -> Result<Self, String> {
        let line = text
            .lines()
            .map(|l| l.split(';').next().unwrap_or_default().trim())
            .find(|l| l.split_whitespace().any(|t| t.eq_ignore_ascii_case("DNSKEY")))
            .ok_or_else(|| "No DNSKEY record found".to_string())?;

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let pos = tokens
            .iter()
            .position(|t| t.eq_ignore_ascii_case("DNSKEY"))
            .ok_or_else(|| "No DNSKEY record found".to_string())?;

        let ttl = tokens[1..pos]
            .iter()
            .find_map(|t| t.parse::<u32>().ok())
            .unwrap_or(DEFAULT_DNSKEY_TTL);

        let field = |offset: usize| {
            tokens
                .get(pos + offset)
                .copied()
                .ok_or_else(|| "Truncated DNSKEY record".to_string())
        };
        let flags: u16 = field(1)?.parse().map_err(|e| format!("Invalid flags: {e}"))?;
        let protocol: u8 = field(2)?.parse().map_err(|e| format!("Invalid protocol: {e}"))?;
        let algorithm: u8 = field(3)?.parse().map_err(|e| format!("Invalid algorithm: {e}"))?;

        let encoded: String = tokens.get(pos + 4..).unwrap_or_default().concat();
        let public_key = STANDARD
            .decode(encoded)
            .map_err(|e| format!("Invalid public key: {e}"))?;
        if public_key.is_empty() {
            return Err("Empty public key".to_string());
        }

        Ok(Self {
            ttl,
            flags,
            protocol,
            algorithm,
            public_key,
        })
    }

    pub fn is_ksk(&self) -> bool {
        self.flags & 0x0001 != 0
    }

    pub fn rdata_wire(&self) -> Vec<u8> {
        let mut wire = Vec::with_capacity(4 + self.public_key.len());
        wire.extend_from_slice(&self.flags.to_be_bytes());
        wire.push(self.protocol);
        wire.push(self.algorithm);
        wire.extend_from_slice(&self.public_key);
        wire
    }

    /// Key tag (RFC 4034 Appendix B).
    pub fn key_tag(&self) -> u16 {
        let wire = self.rdata_wire();
        let mut accumulator: u32 = 0;

        for chunk in wire.chunks(2) {
            if chunk.len() == 2 {
                accumulator += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
            } else {
                accumulator += u32::from(chunk[0]) << 8;
            }
        }
        accumulator += accumulator >> 16;

        (accumulator & 0xFFFF) as u16
    }

    pub fn to_record(&self, owner: &Name) -> Record {
        Record::from_rdata(
            owner.clone(),
            self.ttl,
            RData::Unknown {
                code: RecordType::DNSKEY,
                rdata: NULL::with(self.rdata_wire()),
            },
        )
    }
}

enum KeySigner {
    Rsa {
        key: RsaKeyPair,
        encoding: &'static dyn RsaEncoding,
    },
    Ecdsa(EcdsaKeyPair),
    Ed25519(Ed25519KeyPair),
    Unsupported,
}

/// A zone key able to produce RRSIG signatures.
pub struct SigningKey {
    pub dnskey: Dnskey,
    key_tag: u16,
    signer: KeySigner,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.dnskey.algorithm)
            .field("key_tag", &self.key_tag)
            .field("ksk", &self.dnskey.is_ksk())
            .finish()
    }
}

impl SigningKey {
    /// Build a key from its stored DNSKEY text and BIND private key text.
    /// Algorithms without a signer load but refuse to sign.
    pub fn from_stored(zone: &str, public: &str, private: &str) -> Result<Self, DomainError> {
        let invalid = |reason: String| DomainError::InvalidKey {
            zone: zone.to_string(),
            reason,
        };

        let dnskey = Dnskey::parse(public).map_err(invalid)?;
        let fields = parse_private_key(private);

        let declared = fields
            .get("algorithm")
            .and_then(|v| v.split_whitespace().next())
            .and_then(|v| v.parse::<u8>().ok());
        if let Some(declared) = declared {
            if declared != dnskey.algorithm {
                return Err(invalid(format!(
                    "Private key algorithm {declared} does not match DNSKEY algorithm {}",
                    dnskey.algorithm
                )));
            }
        }

        let signer = match dnskey.algorithm {
            8 => rsa_signer(&fields, &RSA_PKCS1_SHA256).map_err(invalid)?,
            10 => rsa_signer(&fields, &RSA_PKCS1_SHA512).map_err(invalid)?,
            13 => ecdsa_signer(&fields, &dnskey, &ECDSA_P256_SHA256_FIXED_SIGNING)
                .map_err(invalid)?,
            14 => ecdsa_signer(&fields, &dnskey, &ECDSA_P384_SHA384_FIXED_SIGNING)
                .map_err(invalid)?,
            15 => ed25519_signer(&fields, &dnskey).map_err(invalid)?,
            _ => KeySigner::Unsupported,
        };

        Ok(Self {
            key_tag: dnskey.key_tag(),
            dnskey,
            signer,
        })
    }

    pub fn key_tag(&self) -> u16 {
        self.key_tag
    }

    pub fn algorithm(&self) -> u8 {
        self.dnskey.algorithm
    }

    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, DomainError> {
        let failed = || DomainError::Signing(format!("Key {} failed to sign", self.key_tag));
        match &self.signer {
            KeySigner::Rsa { key, encoding } => {
                let rng = SystemRandom::new();
                let mut signature = vec![0u8; key.public().modulus_len()];
                key.sign(*encoding, &rng, data, &mut signature)
                    .map_err(|_| failed())?;
                Ok(signature)
            }
            KeySigner::Ecdsa(key) => {
                let rng = SystemRandom::new();
                let signature = key.sign(&rng, data).map_err(|_| failed())?;
                Ok(signature.as_ref().to_vec())
            }
            KeySigner::Ed25519(key) => Ok(key.sign(data).as_ref().to_vec()),
            KeySigner::Unsupported => Err(DomainError::Signing(format!(
                "Unsupported DNSSEC algorithm {}",
                self.dnskey.algorithm
            ))),
        }
    }
}

/// `Key: value` lines of a BIND `Private-key-format` file, keys lowercased.
fn parse_private_key(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect()
}

fn decode_field(fields: &HashMap<String, String>, name: &str) -> Result<Vec<u8>, String> {
    let value = fields
        .get(name)
        .ok_or_else(|| format!("Missing private key field {name}"))?;
    STANDARD
        .decode(value)
        .map_err(|e| format!("Invalid base64 in {name}: {e}"))
}

fn rsa_signer(
    fields: &HashMap<String, String>,
    encoding: &'static dyn RsaEncoding,
) -> Result<KeySigner, String> {
    let names = [
        "modulus",
        "publicexponent",
        "privateexponent",
        "prime1",
        "prime2",
        "exponent1",
        "exponent2",
        "coefficient",
    ];
    let mut parts = Vec::with_capacity(names.len());
    for name in names {
        parts.push(decode_field(fields, name)?);
    }

    let der = rsa_private_key_der(&parts);
    let key = RsaKeyPair::from_der(&der).map_err(|e| format!("Rejected RSA key: {e}"))?;
    Ok(KeySigner::Rsa { key, encoding })
}

fn ecdsa_signer(
    fields: &HashMap<String, String>,
    dnskey: &Dnskey,
    algorithm: &'static ring::signature::EcdsaSigningAlgorithm,
) -> Result<KeySigner, String> {
    let private_key = decode_field(fields, "privatekey")?;
    // DNSKEY carries X || Y; ring expects an uncompressed SEC1 point.
    let mut public_key = Vec::with_capacity(dnskey.public_key.len() + 1);
    public_key.push(0x04);
    public_key.extend_from_slice(&dnskey.public_key);

    let rng = SystemRandom::new();
    let key = EcdsaKeyPair::from_private_key_and_public_key(
        algorithm,
        &private_key,
        &public_key,
        &rng,
    )
    .map_err(|e| format!("Rejected ECDSA key: {e}"))?;
    Ok(KeySigner::Ecdsa(key))
}

fn ed25519_signer(fields: &HashMap<String, String>, dnskey: &Dnskey) -> Result<KeySigner, String> {
    let seed = decode_field(fields, "privatekey")?;
    let key = Ed25519KeyPair::from_seed_and_public_key(&seed, &dnskey.public_key)
        .map_err(|e| format!("Rejected Ed25519 key: {e}"))?;
    Ok(KeySigner::Ed25519(key))
}

/// PKCS#1 `RSAPrivateKey` DER from its eight components.
fn rsa_private_key_der(parts: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    der_integer(&[0], &mut body);
    for part in parts {
        der_integer(part, &mut body);
    }

    let mut der = vec![0x30];
    der_length(body.len(), &mut der);
    der.extend_from_slice(&body);
    der
}

fn der_integer(value: &[u8], out: &mut Vec<u8>) {
    let start = value.iter().position(|&b| b != 0).unwrap_or(value.len().saturating_sub(1));
    let value = &value[start..];
    let value = if value.is_empty() { &[0u8][..] } else { value };

    out.push(0x02);
    if value[0] & 0x80 != 0 {
        der_length(value.len() + 1, out);
        out.push(0);
    } else {
        der_length(value.len(), out);
    }
    out.extend_from_slice(value);
}

fn der_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

/// Public half of an Ed25519 key derived from a seed, for DNSKEY text.
pub fn ed25519_public_key(seed: &[u8]) -> Result<Vec<u8>, DomainError> {
    let key = Ed25519KeyPair::from_seed_unchecked(seed)
        .map_err(|e| DomainError::Signing(format!("Rejected Ed25519 seed: {e}")))?;
    Ok(key.public_key().as_ref().to_vec())
}
