//! Disk identity resolver
//!
//! Firmware gives us no trustworthy way to tell two structurally identical
//! disks apart, so the loader fingerprints each one by checksumming small
//! content samples. Offsets are chosen to maximize diagnostic entropy
//! cheaply: boot block first, then the common superblock region, then
//! clock-seeded offsets once the structured probes are exhausted. The whole
//! pass is bounded; byte-identical clones stay ambiguous and boot proceeds
//! with a warning.

use crate::firmware::{BlockIo, MonotonicClock};
use crate::log_info;

use super::error::IdentityError;
use super::identity::CHECKSUM_CAPACITY;
use super::{DeviceList, Drive};

/// Size of one checksum probe in bytes.
pub const CHECK_SUM_BLOCK_SIZE: usize = 512;

/// Absolute bound on disambiguation rounds.
pub const MAX_TRIES: usize = 200;

/// Probe offset for disambiguation round `index`.
///
/// `min_size` is the smallest byte size among the candidate drives, so every
/// structured offset lands on all of them.
pub fn next_check_sum_offset<C: MonotonicClock>(
    index: usize,
    min_size: u64,
    clock: &mut C,
) -> u64 {
    // The boot block carries the highest-entropy content on typical media.
    if index < 2 {
        return index as u64 * 512;
    }

    // Shortly past the first kilobytes, where superblocks commonly live.
    if index < 4 {
        return (min_size >> 10) + index as u64 * 2048;
    }

    // Structured probes exhausted; sample a clock-seeded block so that two
    // disks built from the same image do not match at every probe point.
    let window = min_size >> 9;
    if window == 0 {
        return 0;
    }
    (clock.now().wrapping_add(index as u64) % window) * 512
}

/// Checksum of the probe block at `offset`.
///
/// The sum is over the full probe buffer interpreted as little-endian u32
/// words with wrapping addition. Short reads are zero-padded first, so two
/// short reads of the same prefix always produce the same sum; a failed
/// read yields 0 without aborting the round.
pub fn compute_check_sum<Io: BlockIo>(drive: &mut Drive<Io>, offset: u64) -> u32 {
    let mut buffer = [0u8; CHECK_SUM_BLOCK_SIZE];

    let bytes_read = match drive.read_at(offset, &mut buffer) {
        Ok(n) => n,
        Err(_) => return 0,
    };

    if bytes_read < buffer.len() {
        buffer[bytes_read..].fill(0);
    }

    let mut sum = 0u32;
    for word in buffer.chunks_exact(4) {
        // chunks_exact: CHECK_SUM_BLOCK_SIZE is a multiple of 4
        sum = sum.wrapping_add(u32::from_le_bytes([word[0], word[1], word[2], word[3]]));
    }

    sum
}

/// Refine the identifiers of all unknown-type drives until they are pairwise
/// distinguishable, or the round budget runs out.
///
/// Each round samples one new offset across every still-unknown drive into
/// slot `round % CHECKSUM_CAPACITY`, discarding the oldest evidence once the
/// slots wrap. Terminates within [`MAX_TRIES`] rounds; exhaustion means at
/// least one drive is most likely a byte-identical clone of another, which
/// is reported as [`IdentityError::Ambiguous`] and left for the caller to
/// warn about - boot continues with the best-available identifiers.
pub fn find_unique_check_sums<Io: BlockIo, C: MonotonicClock>(
    devices: &mut DeviceList<Io>,
    clock: &mut C,
) -> Result<(), IdentityError> {
    let mut min_size: u64 = 0;
    let mut index: usize = 0;

    while index < MAX_TRIES {
        let mut clash = false;

        'scan: for i in 0..devices.len() {
            let drive = match devices.get(i) {
                Some(drive) => drive,
                None => continue,
            };
            if drive.identity().is_resolved() {
                continue;
            }

            if min_size == 0 || drive.size() < min_size {
                min_size = drive.size();
            }

            for j in 0..devices.len() {
                if j == i {
                    continue;
                }
                let other = match devices.get(j) {
                    Some(other) => other,
                    None => continue,
                };
                if other.identity().is_resolved() {
                    continue;
                }

                if drive.identity().check_sums_match(other.identity()) {
                    clash = true;
                    break 'scan;
                }
            }
        }

        if !clash {
            return Ok(());
        }

        // Add a new sample to every still-ambiguous identifier.
        let offset = next_check_sum_offset(index, min_size, clock);
        let slot = index % CHECKSUM_CAPACITY;

        for i in 0..devices.len() {
            let drive = match devices.get_mut(i) {
                Some(drive) => drive,
                None => continue,
            };
            if drive.identity().is_resolved() {
                continue;
            }

            let sum = compute_check_sum(drive, offset);
            drive.identity_mut().record_check_sum(slot, offset, sum);
        }

        index += 1;
    }

    log_info!("could not make drives unique, might boot from the wrong disk");
    Err(IdentityError::Ambiguous)
}
