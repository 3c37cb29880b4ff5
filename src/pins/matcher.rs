use log::{debug, error};

use crate::{
    pins::{HashValue, PinIdentifier, Pinset},
    preload::PreloadResult,
    Result,
};

/// Decides whether a set of public key hashes satisfies a host's pinset.
///
/// The matcher borrows a pinset table, normally the one of the [`crate::PreloadedDatabase`] the
/// [`PreloadResult`] was resolved from.
#[derive(Debug, Clone, Copy)]
pub struct PinMatcher<'a> {
    pinsets: &'a [Pinset],
}

impl<'a> PinMatcher<'a> {
    /// Create a matcher over `pinsets`, indexed by pinset id.
    #[must_use]
    pub fn new(pinsets: &'a [Pinset]) -> Self {
        PinMatcher { pinsets }
    }

    /// Check `hashes` against the pinset referenced by `preload`.
    ///
    /// Hosts without pins pass. Otherwise a hash equal to any rejected pin fails the check, even
    /// if another hash is accepted; failing that, the check passes iff some hash equals some
    /// accepted pin.
    ///
    /// # Errors
    /// Returns [`crate::Error::InternalError`] if a SHA-256 hash is supplied for a pinned host or
    /// the host's pinset holds a SHA-256 pin, and [`crate::Error::Malformed`] if a pin in the
    /// table cannot be decoded.
    pub fn check_pubkey_pins(&self, preload: &PreloadResult, hashes: &[HashValue]) -> Result<bool> {
        if !preload.has_pins {
            return Ok(true);
        }

        let Some(pinset) = self.pinsets.get(preload.pinset_id as usize) else {
            return Ok(true);
        };

        for hash in hashes {
            hash.algo().ensure_supported()?;
        }
        for pin in pinset.accepted_pins.iter().chain(&pinset.rejected_pins) {
            pin.decode()?.algo().ensure_supported()?;
        }

        if hashes_intersect(&pinset.rejected_pins, hashes)? {
            error!("Public key hash matches a rejected pin of pinset '{}'", pinset.name);
            return Ok(false);
        }

        if !hashes_intersect(&pinset.accepted_pins, hashes)? {
            error!("No public key hash matches pinset '{}'", pinset.name);
            return Ok(false);
        }

        debug!("Public key hash matches pinset '{}'", pinset.name);
        Ok(true)
    }
}

fn hashes_intersect(pins: &[PinIdentifier], hashes: &[HashValue]) -> Result<bool> {
    for pin in pins {
        for hash in hashes {
            if pin.matches(hash)? {
                return Ok(true);
            }
        }
    }

    Ok(false)
}
