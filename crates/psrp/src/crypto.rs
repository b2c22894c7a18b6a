use aes::Aes256;
use cipher::block_padding::Pkcs7;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rsa::pkcs1v15::Pkcs1v15Encrypt;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::debug;

use crate::{PsrpError, Result};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const RSA_KEY_BITS: usize = 2048;
const RSA_MODULUS_LEN: usize = RSA_KEY_BITS / 8;

/// SecureString payloads are encrypted with a zero IV: the key itself is
/// single-use (fresh per session), so CBC's usual chosen-plaintext concerns
/// don't apply, and PSRP's own wire format carries no IV field to transmit
/// one in.
const SECURE_STRING_IV: [u8; 16] = [0u8; 16];

/// How many bytes precede the 256-byte RSA ciphertext in an
/// `EncryptedSessionKey.EncryptedSessionKey` blob. PSRP borrows the .NET
/// `EncryptedXml`/CAPI wire shape here, which prefixes the ciphertext with a
/// 12-byte header this crate doesn't otherwise interpret.
const ENCRYPTED_SESSION_KEY_PREFIX_LEN: usize = 12;

/// The client side of the RSA/AES key exchange (§4.4's `PublicKey` /
/// `EncryptedSessionKey` handshake): generates a throwaway RSA-2048
/// keypair, advertises it as a `PUBLICKEYBLOB`, and unwraps the AES-256
/// session key the server sends back.
pub struct ClientKeyExchange {
    private_key: RsaPrivateKey,
}

impl ClientKeyExchange {
    pub fn generate<R: rand::RngCore + rand::CryptoRng>(rng: &mut R) -> Result<Self> {
        let private_key = RsaPrivateKey::new(rng, RSA_KEY_BITS)?;
        Ok(Self { private_key })
    }

    /// Encodes this keypair's public half as a Microsoft `PUBLICKEYBLOB`,
    /// base64-encoded as the `PublicKey` message carries it.
    pub fn public_key_blob_base64(&self) -> Result<String> {
        Ok(base64_encode(&encode_public_key_blob(
            &self.private_key.to_public_key(),
        )?))
    }

    /// Unwraps a base64 `EncryptedSessionKey.EncryptedSessionKey` blob into
    /// the raw 32-byte AES-256 session key.
    pub fn unwrap_session_key(&self, encrypted_session_key_base64: &str) -> Result<[u8; 32]> {
        let blob = base64_decode(encrypted_session_key_base64)?;
        if blob.len() < ENCRYPTED_SESSION_KEY_PREFIX_LEN + RSA_MODULUS_LEN {
            return Err(PsrpError::InvalidMessage(format!(
                "EncryptedSessionKey blob too short: {} bytes",
                blob.len()
            )));
        }
        let ciphertext =
            &blob[ENCRYPTED_SESSION_KEY_PREFIX_LEN..ENCRYPTED_SESSION_KEY_PREFIX_LEN + RSA_MODULUS_LEN];

        let decrypted = self.private_key.decrypt(Pkcs1v15Encrypt, ciphertext)?;
        session_key_from_bytes(&decrypted)
    }
}

/// The server side of the handshake: holds the freshly generated AES
/// session key and wraps it for the peer's advertised RSA public key.
pub struct ServerKeyExchange {
    session_key: [u8; 32],
}

impl ServerKeyExchange {
    pub fn generate<R: rand::RngCore + rand::CryptoRng>(rng: &mut R) -> Self {
        let mut session_key = [0u8; 32];
        rng.fill_bytes(&mut session_key);
        Self { session_key }
    }

    pub fn session_key(&self) -> &[u8; 32] {
        &self.session_key
    }

    /// Decodes a peer-supplied `PUBLICKEYBLOB` and wraps our session key
    /// for it, returning the base64 body of an `EncryptedSessionKey`
    /// message.
    pub fn wrap_session_key<R: rand::RngCore + rand::CryptoRng>(
        &self,
        rng: &mut R,
        public_key_blob_base64: &str,
    ) -> Result<String> {
        let blob = base64_decode(public_key_blob_base64)?;
        let public_key = decode_public_key_blob(&blob)?;
        let ciphertext = public_key.encrypt(rng, Pkcs1v15Encrypt, &self.session_key)?;

        let mut out = Vec::with_capacity(ENCRYPTED_SESSION_KEY_PREFIX_LEN + ciphertext.len());
        out.extend_from_slice(&[0u8; ENCRYPTED_SESSION_KEY_PREFIX_LEN]);
        out.extend_from_slice(&ciphertext);
        Ok(base64_encode(&out))
    }
}

fn session_key_from_bytes(bytes: &[u8]) -> Result<[u8; 32]> {
    bytes
        .try_into()
        .map_err(|_| PsrpError::InvalidMessage(format!("unexpected session key length: {}", bytes.len())))
}

/// Encrypts a secure string's UTF-16LE plaintext with AES-256-CBC/PKCS7,
/// zero IV, per MS-PSRP §2.2.3.4.
pub fn encrypt_secure_string(session_key: &[u8; 32], plaintext_utf16le: &[u8]) -> Result<Vec<u8>> {
    let encryptor = Aes256CbcEnc::new_from_slices(session_key, &SECURE_STRING_IV)
        .map_err(|_| PsrpError::InvalidMessage("invalid AES key/IV length".to_string()))?;
    let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext_utf16le);
    debug!(plaintext_len = plaintext_utf16le.len(), ciphertext_len = ciphertext.len(), "encrypted secure string");
    Ok(ciphertext)
}

/// Decrypts an `<SS>` element's ciphertext back to UTF-16LE plaintext.
pub fn decrypt_secure_string(session_key: &[u8; 32], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let decryptor = Aes256CbcDec::new_from_slices(session_key, &SECURE_STRING_IV)
        .map_err(|_| PsrpError::InvalidMessage("invalid AES key/IV length".to_string()))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| PsrpError::Unpad)
}

/// Encodes a secure string's plaintext as UTF-16LE, the form
/// [`encrypt_secure_string`] expects.
pub fn utf16le_encode(plaintext: &str) -> Vec<u8> {
    plaintext.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Decodes [`decrypt_secure_string`]'s output back to a `String`.
pub fn utf16le_decode(bytes: &[u8]) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(PsrpError::InvalidMessage(
            "secure string plaintext has an odd byte length".to_string(),
        ));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16(&units)
        .map_err(|_| PsrpError::InvalidMessage("secure string plaintext is not valid UTF-16".to_string()))
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn base64_decode(s: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(s.trim())
        .map_err(|e| PsrpError::InvalidMessage(format!("invalid base64: {e}")))
}

const BLOB_MAGIC: [u8; 4] = [0x06, 0x02, 0x00, 0x00];
const BLOB_KEYTYPE: [u8; 4] = [0x00, 0xA4, 0x00, 0x00];
const BLOB_RSA1: [u8; 4] = *b"RSA1";
const BLOB_BITLEN_2048: [u8; 4] = [0x00, 0x08, 0x00, 0x00];

/// Encodes an RSA public key as a little-endian Microsoft `PUBLICKEYBLOB`
/// (`BLOBHEADER` + `RSAPUBKEY` + little-endian modulus), the format
/// `PublicKey.PublicKey` carries.
fn encode_public_key_blob(public_key: &RsaPublicKey) -> Result<Vec<u8>> {
    let exponent_be = public_key.e().to_bytes_be();
    if exponent_be.is_empty() || exponent_be.len() > 4 {
        return Err(PsrpError::InvalidMessage(format!(
            "unexpected RSA public exponent length: {} bytes",
            exponent_be.len()
        )));
    }
    let mut exponent_be_padded = [0u8; 4];
    exponent_be_padded[4 - exponent_be.len()..].copy_from_slice(&exponent_be);
    let exponent_le = u32::from_be_bytes(exponent_be_padded).to_le_bytes();

    let mut modulus_be = public_key.n().to_bytes_be();
    if modulus_be.len() > RSA_MODULUS_LEN {
        return Err(PsrpError::InvalidMessage(format!(
            "RSA modulus too large: {} bytes",
            modulus_be.len()
        )));
    }
    if modulus_be.len() < RSA_MODULUS_LEN {
        let mut padded = vec![0u8; RSA_MODULUS_LEN - modulus_be.len()];
        padded.extend_from_slice(&modulus_be);
        modulus_be = padded;
    }
    let modulus_le: Vec<u8> = modulus_be.into_iter().rev().collect();

    let mut blob = Vec::with_capacity(20 + RSA_MODULUS_LEN);
    blob.extend_from_slice(&BLOB_MAGIC);
    blob.extend_from_slice(&BLOB_KEYTYPE);
    blob.extend_from_slice(&BLOB_RSA1);
    blob.extend_from_slice(&BLOB_BITLEN_2048);
    blob.extend_from_slice(&exponent_le);
    blob.extend_from_slice(&modulus_le);
    Ok(blob)
}

fn decode_public_key_blob(blob: &[u8]) -> Result<RsaPublicKey> {
    if blob.len() != 20 + RSA_MODULUS_LEN {
        return Err(PsrpError::InvalidMessage(format!(
            "PUBLICKEYBLOB has unexpected length: {} bytes",
            blob.len()
        )));
    }
    if blob[0..4] != BLOB_MAGIC || blob[4..8] != BLOB_KEYTYPE || blob[8..12] != BLOB_RSA1 {
        return Err(PsrpError::InvalidMessage(
            "PUBLICKEYBLOB header does not match RSA1 magic".to_string(),
        ));
    }

    let exponent_le: [u8; 4] = blob[16..20].try_into().unwrap();
    let exponent = u32::from_le_bytes(exponent_le);

    let mut modulus_le = blob[20..20 + RSA_MODULUS_LEN].to_vec();
    modulus_le.reverse();

    RsaPublicKey::new(
        rsa::BigUint::from_bytes_be(&modulus_le),
        rsa::BigUint::from(exponent),
    )
    .map_err(PsrpError::Rsa)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_string_round_trips() {
        let key = [7u8; 32];
        let plaintext = "hunter2".encode_utf16().flat_map(u16::to_le_bytes).collect::<Vec<u8>>();
        let ciphertext = encrypt_secure_string(&key, &plaintext).unwrap();
        let decrypted = decrypt_secure_string(&key, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn key_exchange_round_trips() {
        let mut rng = rand::thread_rng();
        let client = ClientKeyExchange::generate(&mut rng).unwrap();
        let server = ServerKeyExchange::generate(&mut rng);

        let public_key_blob = client.public_key_blob_base64().unwrap();
        let wrapped = server.wrap_session_key(&mut rng, &public_key_blob).unwrap();
        let unwrapped = client.unwrap_session_key(&wrapped).unwrap();

        assert_eq!(&unwrapped, server.session_key());
    }
}
