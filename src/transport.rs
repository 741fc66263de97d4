//! # USB-MIDI event packets
//!
//! USB-MIDI carries MIDI in 4 byte event packets. The low nibble of the first byte, the code index number, says how
//! many of the remaining three bytes are MIDI data. The cable number in the high nibble is ignored.

use crate::{
    engine::MidiSink,
    error::{Error, Result},
};

/// The number of MIDI bytes in a packet, indexed by code index number
pub const CIN_PAYLOAD_LEN: [usize; 16] = [0, 0, 2, 3, 3, 1, 2, 3, 3, 3, 3, 3, 2, 2, 3, 1];

/// The length of one event packet
pub const PACKET_LEN: usize = 4;

/// `packet_payload(p)` is the MIDI data carried by event packet `p`
///
/// # Example
///
/// ```
/// use nano_midi::transport::packet_payload;
///
/// // cable 0, note-on
/// assert_eq!(packet_payload(&[0x09, 0x90, 60, 100]), &[0x90, 60, 100]);
///
/// // cable 0, program change, the last byte is padding
/// assert_eq!(packet_payload(&[0x0C, 0xC0, 5, 0]), &[0xC0, 5]);
/// ```
pub fn packet_payload(packet: &[u8; PACKET_LEN]) -> &[u8] {
    let len = CIN_PAYLOAD_LEN[(packet[0] & 0x0F) as usize];
    &packet[1..1 + len]
}

/// `play_packets(sink, bytes)` plays a stream of event packets into `sink`
///
/// # Errors
///
/// * `UnalignedPacketStream` - the length of `bytes` is not a multiple of 4, nothing is played
pub fn play_packets<S: MidiSink + ?Sized>(sink: &mut S, bytes: &[u8]) -> Result<()> {
    if bytes.len() % PACKET_LEN != 0 {
        log::warn!("transport: dropping {} bytes, not whole packets", bytes.len());
        return Err(Error::UnalignedPacketStream(bytes.len()));
    }

    for packet in bytes.chunks_exact(PACKET_LEN) {
        let mut p = [0_u8; PACKET_LEN];
        p.copy_from_slice(packet);
        sink.play(packet_payload(&p));
    }

    Ok(())
}
