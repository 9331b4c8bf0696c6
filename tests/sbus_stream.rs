use boardlink::devices::sbus::{SbusFrame, SbusRx, FRAME_LEN, HEADER};
use boardlink::transport::MemoryTransport;

fn frame_with(ch0: i16, ch7: i16) -> SbusFrame {
    let mut frame = SbusFrame::default();
    frame.channels[0] = ch0;
    frame.channels[7] = ch7;
    frame.failsafe = false;
    frame.lost_frame = false;
    frame
}

fn centred_with(ch0: i16) -> SbusFrame {
    let mut frame = frame_with(992, 992);
    frame.channels = [992; 16];
    frame.channels[0] = ch0;
    frame
}

#[test]
fn begin_discards_half_collected_frame() {
    let half = centred_with(992).encode();
    let full = centred_with(1500).encode();

    // Without a reset the stale half frame swallows the next one.
    let mut stale = SbusRx::new(MemoryTransport::new());
    stale.transport_mut().feed(&half[..10]);
    assert!(!stale.read().unwrap());
    stale.transport_mut().feed(&full);
    assert!(!stale.read().unwrap());
    assert_eq!(stale.frames_decoded(), 0);

    let mut rx = SbusRx::new(MemoryTransport::new());
    rx.transport_mut().feed(&half[..10]);
    assert!(!rx.read().unwrap());
    rx.begin();
    rx.transport_mut().feed(&full);
    assert!(rx.read().unwrap());
    assert_eq!(rx.ch(0), Some(1500));
    assert_eq!(rx.frames_decoded(), 1);
}

#[test]
fn starts_in_failsafe_until_first_frame() {
    let mut rx = SbusRx::new(MemoryTransport::new());
    assert!(rx.failsafe());
    assert!(rx.lost_frame());
    assert!(!rx.read().unwrap());
    assert_eq!(rx.frames_decoded(), 0);

    rx.transport_mut().feed(&frame_with(992, 172).encode());
    assert!(rx.read().unwrap());
    assert!(!rx.failsafe());
    assert_eq!(rx.ch(0), Some(992));
    assert_eq!(rx.ch(7), Some(172));
    assert_eq!(rx.ch(16), None);
}

#[test]
fn skips_junk_before_first_header() {
    let mut rx = SbusRx::new(MemoryTransport::new());
    // A 0x0F not preceded by a footer byte must not start a frame.
    rx.transport_mut().feed(&[0x55, HEADER, 0x12, 0x00]);
    rx.transport_mut().feed(&frame_with(1811, 0).encode());
    assert!(rx.read().unwrap());
    assert_eq!(rx.ch(0), Some(1811));
    assert_eq!(rx.frames_decoded(), 1);
}

#[test]
fn back_to_back_frames_keep_the_newest() {
    let mut rx = SbusRx::new(MemoryTransport::new());
    let mut stream = Vec::new();
    stream.extend_from_slice(&frame_with(100, 200).encode());
    stream.extend_from_slice(&frame_with(300, 400).encode());
    rx.transport_mut().feed(&stream);

    assert!(rx.read().unwrap());
    assert_eq!(rx.frames_decoded(), 2);
    assert_eq!(rx.ch(0), Some(300));
    assert_eq!(rx.ch(7), Some(400));
}

#[test]
fn frame_split_across_reads_completes_later() {
    let mut rx = SbusRx::new(MemoryTransport::new());
    let raw = frame_with(1000, 1001).encode();
    rx.transport_mut().feed(&raw[..10]);
    assert!(!rx.read().unwrap());
    rx.transport_mut().feed(&raw[10..]);
    assert!(rx.read().unwrap());
    assert_eq!(rx.channels()[0], 1000);
}

#[test]
fn bad_footer_drops_frame_and_keeps_previous_values() {
    let mut rx = SbusRx::new(MemoryTransport::new());
    rx.transport_mut().feed(&frame_with(500, 0).encode());
    assert!(rx.read().unwrap());

    let mut corrupt = frame_with(900, 0).encode();
    corrupt[FRAME_LEN - 1] = 0x33;
    rx.transport_mut().feed(&corrupt);
    assert!(!rx.read().unwrap());
    assert_eq!(rx.ch(0), Some(500));
    assert_eq!(rx.frames_decoded(), 1);
}

#[test]
fn flags_surface_through_accessors() {
    let mut rx = SbusRx::new(MemoryTransport::new());
    let mut frame = frame_with(0, 0);
    frame.ch17 = true;
    frame.failsafe = true;
    rx.transport_mut().feed(&frame.encode());
    assert!(rx.read().unwrap());
    assert!(rx.ch17());
    assert!(!rx.ch18());
    assert!(rx.failsafe());
    assert!(!rx.lost_frame());
    assert_eq!(rx.frame(), frame);
}
