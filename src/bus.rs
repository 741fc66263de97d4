//! Register bus
//!
//! The sound chips are reached through whatever serial link the board wires up, SPI for the YMF825 and a shift
//! register for the YMZ294. The drivers only ever see this trait.
//!
//! Writes are fire-and-forget. If the link times out the implementation drops the transaction, there is no retry and
//! nothing is reported back.

/// A register-addressed link to a sound chip
pub trait RegisterBus {
    /// `bus.write(a, d)` writes byte `d` to register `a`
    fn write(&mut self, address: u8, data: u8) {
        self.write_burst(address, &[data])
    }

    /// `bus.write_burst(a, data)` writes every byte of `data` to register `a` in a single transaction
    fn write_burst(&mut self, address: u8, data: &[u8]);

    /// `bus.read(a)` is the value of register `a`
    fn read(&mut self, address: u8) -> u8;

    /// `bus.delay_ms(ms)` blocks for `ms` milliseconds, chip power-up sequences need it
    fn delay_ms(&mut self, ms: u32) {
        let _ = ms;
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn write(&mut self, address: u8, data: u8) {
        (**self).write(address, data)
    }

    fn write_burst(&mut self, address: u8, data: &[u8]) {
        (**self).write_burst(address, data)
    }

    fn read(&mut self, address: u8) -> u8 {
        (**self).read(address)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}


#[cfg(test)]
mod tests {
    use super::mock::{BusOp, RecordingBus};
    use super::*;

    #[test]
    fn single_write_is_a_one_byte_burst() {
        let mut bus = RecordingBus::new();
        bus.write(0x0B, 3);
        assert_eq!(bus.ops, [BusOp::Write(0x0B, vec![3])]);
        assert_eq!(bus.writes(), [(0x0B, 3)]);
    }

    #[test]
    fn bursts_are_kept_whole() {
        let mut bus = RecordingBus::new();
        bus.write_burst(0x07, &[1, 2, 3]);
        assert_eq!(bus.bursts_to(0x07), [vec![1, 2, 3]]);
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn delay_defaults_to_nothing() {
        struct Silent;
        impl RegisterBus for Silent {
            fn write_burst(&mut self, _address: u8, _data: &[u8]) {}
            fn read(&mut self, _address: u8) -> u8 {
                0x5A
            }
        }

        let mut bus = Silent;
        bus.delay_ms(30);
        assert_eq!(bus.read(0), 0x5A);
    }

    #[test]
    fn mutable_references_are_buses_too() {
        fn poke<B: RegisterBus>(mut bus: B) {
            bus.write(0x07, 0x38);
            bus.delay_ms(1);
        }

        let mut bus = RecordingBus::new();
        poke(&mut bus);
        assert_eq!(bus.ops, [BusOp::Write(0x07, vec![0x38]), BusOp::Delay(1)]);
    }
}
