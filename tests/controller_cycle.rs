use boardlink::control::{ControlModel, ExtInputs, ExtOutputs, ModelParams, IO_LEN};
use boardlink::controller::{Controller, CycleReport, Objects};
use boardlink::devices::sbus::{self, SbusFrame, SbusRx};
use boardlink::link::{Link, Packed, Region};
use boardlink::transport::MemoryTransport;

const HEADER: u32 = 0xAABB_CCDD;
const TERMINATOR: u32 = 0x1122_3344;

#[test]
fn host_sees_outputs_and_receiver_data() {
    let objects = Objects::new();
    let board_link = Link::new(MemoryTransport::new(), HEADER, TERMINATOR);
    let mut board = Controller::new(
        board_link,
        &objects,
        ControlModel::new(ModelParams { gain: 3.0 }),
        Some(SbusRx::new(MemoryTransport::new())),
    )
    .unwrap();

    let host_in = Region::<IO_LEN>::new();
    let host_out = Region::<IO_LEN>::new();
    let host_sbus = Region::<{ sbus::PACKED_LEN }>::new();
    let mut host = Link::new(MemoryTransport::new(), HEADER, TERMINATOR);
    assert!(host.attach_tx(host_in.cells()));
    assert!(host.attach_rx(host_out.cells()));
    assert!(host.attach_rx(host_sbus.cells()));

    host_in.store(&ExtInputs {
        input1: 2.0,
        input2: -7.5,
    });
    assert!(host.send());
    let request = host.transport_mut().unwrap().take_written();
    board.link_mut().transport_mut().unwrap().feed(&request);

    let mut stick = SbusFrame::default();
    stick.channels[2] = 1500;
    stick.failsafe = false;
    stick.lost_frame = false;
    board.sbus_mut().unwrap().transport_mut().feed(&stick.encode());

    assert_eq!(
        board.cycle(),
        CycleReport {
            sbus_updated: true,
            received: true,
            sent: true
        }
    );

    let reply = board.link_mut().transport_mut().unwrap().take_written();
    assert_eq!(reply.len(), 4 + IO_LEN + sbus::PACKED_LEN + 4);
    host.transport_mut().unwrap().feed(&reply);
    assert!(host.receive());
    assert_eq!(
        host_out.load::<ExtOutputs>(),
        ExtOutputs {
            output1: 6.0,
            output2: -7.5
        }
    );
    assert_eq!(host_sbus.load::<SbusFrame>(), stick);
}

#[test]
fn rejected_command_keeps_previous_outputs() {
    let objects = Objects::new();
    let link = Link::new(MemoryTransport::new(), HEADER, 0);
    let mut board: Controller<'_, MemoryTransport> =
        Controller::new(link, &objects, ControlModel::default(), None).unwrap();

    let mut good = HEADER.to_le_bytes().to_vec();
    good.extend_from_slice(
        &ExtInputs {
            input1: 1.0,
            input2: 1.0,
        }
        .to_bytes(),
    );
    board.link_mut().transport_mut().unwrap().feed(&good);
    assert!(board.cycle().received);
    assert_eq!(board.model().outputs().output1, 2.0);

    // Wrong header: inputs stay as they were and the old outputs go out again.
    let mut bad = vec![0x00, 0x00, 0x00, 0x00];
    bad.extend_from_slice(&[0u8; IO_LEN]);
    board.link_mut().transport_mut().unwrap().feed(&bad);
    let report = board.cycle();
    assert!(!report.received);
    assert!(report.sent);
    assert_eq!(objects.inputs.load::<ExtInputs>().input1, 1.0);

    let writes = board.link().transport().unwrap().writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0], writes[1]);
}

#[test]
fn board_without_receiver_sends_outputs_only() {
    let objects = Objects::new();
    let link = Link::new(MemoryTransport::new(), 0, 0);
    let board: Controller<'_, MemoryTransport> =
        Controller::new(link, &objects, ControlModel::default(), None).unwrap();
    assert_eq!(board.link().tx_slots(), 1);
    assert_eq!(board.link().tx_bytes(), IO_LEN);
    assert_eq!(board.link().rx_bytes(), IO_LEN);
    // Receiver region still holds the no-signal frame.
    assert!(objects.sbus.load::<SbusFrame>().failsafe);
}

#[test]
fn controller_start_resets_receiver_decoder() {
    let mut centred = SbusFrame::default();
    centred.channels = [992; 16];
    centred.failsafe = false;
    centred.lost_frame = false;
    let mut moved = centred;
    moved.channels[0] = 1500;

    // Receiver saw half a frame before the loop was set up.
    let mut receiver = SbusRx::new(MemoryTransport::new());
    receiver.transport_mut().feed(&centred.encode()[..10]);
    assert!(!receiver.read().unwrap());

    let objects = Objects::new();
    let link = Link::new(MemoryTransport::new(), 0, 0);
    let mut board =
        Controller::new(link, &objects, ControlModel::default(), Some(receiver)).unwrap();
    board.sbus_mut().unwrap().transport_mut().feed(&moved.encode());

    assert!(board.cycle().sbus_updated);
    assert_eq!(objects.sbus.load::<SbusFrame>(), moved);
}
