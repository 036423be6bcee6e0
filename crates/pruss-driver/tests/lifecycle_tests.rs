//! Lifecycle and kick-path tests
//!
//! Start/stop transitions, transport preconditions, vendor resource
//! handling, and best-effort kick dispatch over simulated transports.

use pruss_chip::intc::MAX_CHANNELS;
use pruss_chip::mem::PruId;
use pruss_chip::regs::{ctrl, CTRL};
use pruss_driver::sim::{CountingVqHandler, SimLine, SimMailbox, SimPruBuilder};
use pruss_driver::{
    acquire, ClientId, ClientNode, CoreDependency, CoreLink, KickPath, MmioRegion, Pru,
    PruHandle, PrussError,
};
use std::sync::Arc;

fn acquire_core(pru: &Arc<Pru>) -> PruHandle {
    let client = ClientNode {
        name: ClientId("lifecycle-test".into()),
        deps: vec![CoreDependency::new(CoreLink::Ready(Arc::clone(pru)))],
        interrupt_map: None,
    };
    acquire(&client, 0).expect("acquire")
}

fn vendor_payload(pairs: &[(i8, i8)], hosts: [i8; MAX_CHANNELS]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&u32::try_from(pairs.len()).unwrap().to_le_bytes());
    for &(e, c) in pairs {
        out.push(e as u8);
        out.push(c as u8);
    }
    for h in hosts {
        out.push(h as u8);
    }
    out
}

// ── Start / stop ─────────────────────────────────────────────────────────────

#[test]
fn start_programs_entry_point_and_run_enable() {
    let (pru, harness) = SimPruBuilder::new(PruId::Pru0).build();
    let handle = acquire_core(&pru);

    handle.start(0x0800).expect("start");
    let val = harness.regs.read32(CTRL).unwrap();
    assert_eq!(val & ctrl::EN, ctrl::EN);
    // Entry point is programmed in instruction words in the upper half.
    assert_eq!(val >> ctrl::PC_SHIFT, 0x0800 >> 2);

    handle.stop().expect("stop");
    assert_eq!(harness.regs.read32(CTRL).unwrap() & ctrl::EN, 0);
}

#[test]
fn stop_is_idempotent() {
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0).build();
    let handle = acquire_core(&pru);

    handle.stop().expect("stop while already stopped");
    handle.start(0).expect("start");
    handle.stop().expect("stop");
    handle.stop().expect("second stop");
}

#[test]
fn stop_propagates_only_fatal_errors() {
    let (pru, harness) = SimPruBuilder::new(PruId::Pru0).build();
    let handle = acquire_core(&pru);

    harness.regs.set_unreachable(true);
    assert!(matches!(handle.stop(), Err(PrussError::Fatal { .. })));
}

#[test]
fn start_without_dependents_needs_no_transport() {
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0).build();
    let handle = acquire_core(&pru);
    handle.start(0).expect("start without virtqueue dependents");
}

#[test]
fn start_with_dependents_and_no_transport_fails() {
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0).build();
    let handle = acquire_core(&pru);
    handle.set_virtqueue_handler(Some(Arc::new(CountingVqHandler::new(true))));

    assert!(matches!(
        handle.start(0),
        Err(PrussError::MisconfiguredTransport)
    ));
}

#[test]
fn start_with_dependents_and_only_vring_fails() {
    let vring = Arc::new(SimLine::new());
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0)
        .with_vring(Arc::clone(&vring))
        .build();
    let handle = acquire_core(&pru);
    handle.set_virtqueue_handler(Some(Arc::new(CountingVqHandler::new(true))));

    assert!(matches!(
        handle.start(0),
        Err(PrussError::MisconfiguredTransport)
    ));
    assert!(!vring.attached());
}

#[test]
fn start_with_vring_and_kick_attaches_handler() {
    let vring = Arc::new(SimLine::new());
    let kick = Arc::new(SimLine::new());
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0)
        .with_vring(Arc::clone(&vring))
        .with_kick(kick)
        .build();
    let handle = acquire_core(&pru);
    handle.set_virtqueue_handler(Some(Arc::new(CountingVqHandler::new(true))));

    handle.start(0).expect("start");
    assert!(vring.attached());

    handle.stop().expect("stop");
    assert!(!vring.attached(), "stop detaches the vring handler");
}

#[test]
fn start_with_mailbox_skips_vring_handler() {
    let vring = Arc::new(SimLine::new());
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0)
        .with_vring(Arc::clone(&vring))
        .with_mailbox(Arc::new(SimMailbox::new()))
        .build();
    let handle = acquire_core(&pru);
    handle.set_virtqueue_handler(Some(Arc::new(CountingVqHandler::new(true))));

    handle.start(0).expect("start via mailbox");
    assert!(!vring.attached(), "mailbox path does not claim the vring line");
}

#[test]
fn failed_vring_attach_tears_down_firmware_table() {
    let vring = Arc::new(SimLine::new());
    let kick = Arc::new(SimLine::new());
    let (pru, harness) = SimPruBuilder::new(PruId::Pru0)
        .with_vring(Arc::clone(&vring))
        .with_kick(kick)
        .build();
    let handle = acquire_core(&pru);
    handle.set_virtqueue_handler(Some(Arc::new(CountingVqHandler::new(true))));

    handle
        .apply_vendor_intrmap(&vendor_payload(&[(19, 1)], [-1; MAX_CHANNELS]))
        .expect("vendor table");
    assert!(harness.intc.active().is_some());

    vring.fail_attach(true);
    assert!(handle.start(0).is_err());
    assert!(
        harness.intc.active().is_none(),
        "firmware-built table is torn down on failed start"
    );
}

// ── Vendor resource ──────────────────────────────────────────────────────────

#[test]
fn vendor_table_lives_until_stop() {
    let (pru, harness) = SimPruBuilder::new(PruId::Pru0).build();
    let handle = acquire_core(&pru);

    handle
        .apply_vendor_intrmap(&vendor_payload(
            &[(19, 1), (20, 3)],
            [-1, 2, -1, 0, -1, -1, -1, -1, -1, -1],
        ))
        .expect("vendor table");

    let active = harness.intc.active().expect("committed");
    assert_eq!(active.channel_for(19), Some(1));
    assert_eq!(active.host_for(1), Some(2));

    handle.start(0).expect("start");
    handle.stop().expect("stop");
    assert!(harness.intc.active().is_none(), "stop tears the table down");
}

#[test]
fn second_vendor_table_is_rejected() {
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0).build();
    let handle = acquire_core(&pru);

    let payload = vendor_payload(&[(19, 1)], [-1; MAX_CHANNELS]);
    handle.apply_vendor_intrmap(&payload).expect("first table");
    assert!(matches!(
        handle.apply_vendor_intrmap(&payload),
        Err(PrussError::AlreadyConfigured)
    ));
}

#[test]
fn vendor_table_rejected_when_client_map_installed() {
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0).build();
    let client = ClientNode {
        name: ClientId("lifecycle-test".into()),
        deps: vec![CoreDependency::new(CoreLink::Ready(Arc::clone(&pru)))],
        interrupt_map: Some(vec![0, 16, 2, 2]),
    };
    let handle = acquire(&client, 0).expect("acquire");

    assert!(matches!(
        handle.apply_vendor_intrmap(&vendor_payload(&[(19, 1)], [-1; MAX_CHANNELS])),
        Err(PrussError::AlreadyConfigured)
    ));
}

#[test]
fn vendor_table_version_check() {
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0).build();
    let handle = acquire_core(&pru);

    let mut payload = vendor_payload(&[], [-1; MAX_CHANNELS]);
    payload[0] = 3; // version 3
    assert!(matches!(
        handle.apply_vendor_intrmap(&payload),
        Err(PrussError::UnsupportedVersion { version: 3 })
    ));
}

// ── Kick dispatch ────────────────────────────────────────────────────────────

#[test]
fn kick_prefers_trigger_line() {
    let kick = Arc::new(SimLine::new());
    let mailbox = Arc::new(SimMailbox::new());
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0)
        .with_kick(Arc::clone(&kick))
        .with_mailbox(Arc::clone(&mailbox))
        .build();

    assert_eq!(pru.kick_path(), KickPath::TriggerLine);
    let handle = acquire_core(&pru);
    handle.kick(0);
    assert_eq!(kick.raised(), 1);
    assert!(mailbox.sent().is_empty());
}

#[test]
fn kick_falls_back_to_mailbox_payload() {
    let mailbox = Arc::new(SimMailbox::new());
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0)
        .with_mailbox(Arc::clone(&mailbox))
        .build();

    assert_eq!(pru.kick_path(), KickPath::MessageChannel);
    let handle = acquire_core(&pru);
    handle.kick(1);
    handle.kick(0);
    assert_eq!(mailbox.sent(), vec![1, 0]);
}

#[test]
fn kick_without_transport_is_a_silent_noop() {
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0).build();
    assert_eq!(pru.kick_path(), KickPath::None);
    let handle = acquire_core(&pru);
    handle.kick(0);
}

#[test]
fn kick_failure_is_swallowed() {
    let kick = Arc::new(SimLine::new());
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0)
        .with_kick(Arc::clone(&kick))
        .build();
    kick.fail_raise(true);

    let handle = acquire_core(&pru);
    handle.kick(0); // must not panic or surface the failure
    assert_eq!(kick.raised(), 0);
}

// ── Inbound notifications ────────────────────────────────────────────────────

#[test]
fn vring_interrupt_processes_both_queues() {
    let vring = Arc::new(SimLine::new());
    let kick = Arc::new(SimLine::new());
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0)
        .with_vring(Arc::clone(&vring))
        .with_kick(kick)
        .build();
    let handle = acquire_core(&pru);

    let vqs = Arc::new(CountingVqHandler::new(true));
    handle.set_virtqueue_handler(Some(Arc::clone(&vqs) as _));
    handle.start(0).expect("start");

    vring.fire();
    assert_eq!(vqs.dispatched(), vec![0, 1]);
}

#[test]
fn mailbox_callback_processes_payload_queue_only() {
    let (pru, _harness) = SimPruBuilder::new(PruId::Pru0)
        .with_mailbox(Arc::new(SimMailbox::new()))
        .build();
    let handle = acquire_core(&pru);

    let vqs = Arc::new(CountingVqHandler::new(false));
    handle.set_virtqueue_handler(Some(Arc::clone(&vqs) as _));
    handle.start(0).expect("start");

    // No work found is reported, not an error.
    pru.mailbox_callback(1);
    assert_eq!(vqs.dispatched(), vec![1]);
}
