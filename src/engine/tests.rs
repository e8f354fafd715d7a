use super::*;
use crate::clock::SlotGrid;
use crate::limits::MAX_NOTE_LEN;
use crate::store::MemoryStore;
use chrono::NaiveDateTime;
use std::path::PathBuf;

fn test_journal_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("bliss_test_engine");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

fn engine_with(settings: Settings) -> Engine {
    Engine::new(Arc::new(MemoryStore::new()), Arc::new(NotifyHub::new()), settings)
}

fn engine() -> Engine {
    engine_with(Settings::default())
}

fn feb(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, d).unwrap()
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, minute, 0).unwrap()
}

/// Early on the first of February: everything in the tests is in the future.
fn morning() -> NaiveDateTime {
    at(feb(1), 7, 0)
}

async fn add_service(
    engine: &Engine,
    zone: Zone,
    name: &str,
    duration: Minutes,
    from: &str,
    to: &str,
) -> Service {
    engine
        .add_service(ServiceDraft {
            name: name.into(),
            zone,
            duration,
            available_from: from.into(),
            available_to: to.into(),
            is_active: true,
            sort_order: None,
        })
        .await
        .unwrap()
}

async fn add_staff(engine: &Engine, role: StaffRole) -> Staff {
    engine
        .add_staff(StaffDraft {
            name: format!("{role:?} staff"),
            phone: "0899999999".into(),
            email: None,
            role,
            salary_base: 12_000,
            commission_enabled: true,
        })
        .await
        .unwrap()
}

fn draft(service_ids: Vec<Ulid>, date: NaiveDate, time: &str) -> BookingDraft {
    BookingDraft {
        service_ids,
        date,
        time: time.into(),
        customer_name: "Ann".into(),
        customer_phone: "0812345678".into(),
        notes: None,
        slip_image: None,
        channel: Channel::WalkIn,
    }
}

// ── Admission through the store ──────────────────────────

#[tokio::test]
async fn hair_single_seat_scenario() {
    let engine = engine();
    add_staff(&engine, StaffRole::Hair).await;
    let colour = add_service(&engine, Zone::Hair, "Colour", 60, "08:00", "22:00").await;

    engine.submit_booking(draft(vec![colour.id], feb(1), "10:00")).await.unwrap();

    assert!(!engine.is_slot_available(feb(1), "10:30", Zone::Hair, 30).await.unwrap());
    assert!(engine.is_slot_available(feb(1), "11:00", Zone::Hair, 30).await.unwrap());
    assert!(engine.is_slot_available(feb(1), "09:30", Zone::Hair, 30).await.unwrap());
    assert!(!engine.is_slot_available(feb(1), "09:30", Zone::Hair, 60).await.unwrap());
}

#[tokio::test]
async fn nail_two_seat_scenario() {
    let engine = engine();
    add_staff(&engine, StaffRole::Nail).await;
    add_staff(&engine, StaffRole::Nail).await;
    let polish = add_service(&engine, Zone::Nail, "Polish", 45, "10:00", "20:00").await;

    let first = engine.submit_booking(draft(vec![polish.id], feb(1), "14:00")).await.unwrap();
    engine.submit_booking(draft(vec![polish.id], feb(1), "14:00")).await.unwrap();

    let third = engine.submit_booking(draft(vec![polish.id], feb(1), "14:00")).await;
    assert!(matches!(third, Err(EngineError::SlotUnavailable { .. })));
    assert_eq!(engine.bookings_on(feb(1)).await.unwrap().len(), 2);

    engine.cancel(first.id).await.unwrap();
    let third = engine.submit_booking(draft(vec![polish.id], feb(1), "14:00")).await.unwrap();
    assert_eq!(third.status, BookingStatus::Confirmed);
    assert_eq!(engine.active_bookings_on(feb(1)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn zones_do_not_share_seats() {
    let engine = engine();
    add_staff(&engine, StaffRole::Hair).await;
    add_staff(&engine, StaffRole::Nail).await;
    let cut = add_service(&engine, Zone::Hair, "Cut", 30, "08:00", "22:00").await;
    let gel = add_service(&engine, Zone::Nail, "Gel", 60, "08:00", "22:00").await;

    engine.submit_booking(draft(vec![cut.id], feb(1), "10:00")).await.unwrap();
    engine.submit_booking(draft(vec![gel.id], feb(1), "10:00")).await.unwrap();
    assert!(engine.submit_booking(draft(vec![cut.id], feb(2), "10:00")).await.is_ok());
}

#[tokio::test]
async fn no_show_keeps_its_seat() {
    let engine = engine();
    add_staff(&engine, StaffRole::Hair).await;
    let cut = add_service(&engine, Zone::Hair, "Cut", 30, "08:00", "22:00").await;

    let booking = engine.submit_booking(draft(vec![cut.id], feb(1), "10:00")).await.unwrap();
    engine.mark_no_show(booking.id).await.unwrap();

    assert!(!engine.is_slot_available(feb(1), "10:00", Zone::Hair, 30).await.unwrap());
    assert_eq!(engine.unavailable_times_for(feb(1), Zone::Hair, 30).await.unwrap(), vec!["10:00"]);
}

#[tokio::test]
async fn concurrent_submissions_take_one_seat() {
    let engine = Arc::new(engine());
    add_staff(&engine, StaffRole::Hair).await;
    let cut = add_service(&engine, Zone::Hair, "Cut", 30, "08:00", "22:00").await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let eng = engine.clone();
        let ids = vec![cut.id];
        handles.push(tokio::spawn(async move {
            eng.submit_booking(draft(ids, feb(1), "15:00")).await
        }));
    }

    let mut confirmed = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => confirmed += 1,
            Err(e) => {
                assert!(matches!(e, EngineError::SlotUnavailable { .. }));
                assert!(e.is_retryable());
            }
        }
    }
    assert_eq!(confirmed, 1);
    assert_eq!(engine.bookings_on(feb(1)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn day_gates_are_released() {
    let engine = Arc::new(engine());
    add_staff(&engine, StaffRole::Nail).await;
    let gel = add_service(&engine, Zone::Nail, "Gel", 60, "08:00", "22:00").await;

    let mut handles = Vec::new();
    for day in 1..=5 {
        for _ in 0..4 {
            let eng = engine.clone();
            let ids = vec![gel.id];
            handles.push(tokio::spawn(async move {
                eng.submit_booking(draft(ids, feb(day), "12:00")).await
            }));
        }
    }
    let mut confirmed = Vec::new();
    for h in handles {
        if let Ok(booking) = h.await.unwrap() {
            confirmed.push(booking);
        }
    }
    assert_eq!(confirmed.len(), 5);
    assert!(engine.day_locks.is_empty());

    engine.cancel(confirmed[0].id).await.unwrap();
    assert!(engine.is_slot_available(feb(6), "12:00", Zone::Nail, 60).await.unwrap());
    assert!(engine.day_locks.is_empty());
}

// ── Capacity ─────────────────────────────────────────────

#[tokio::test]
async fn capacity_counts_working_staff() {
    let engine = engine();
    let a = add_staff(&engine, StaffRole::Hair).await;
    add_staff(&engine, StaffRole::Hair).await;
    add_staff(&engine, StaffRole::Owner).await;
    add_staff(&engine, StaffRole::Reception).await;
    let idle = add_staff(&engine, StaffRole::Hair).await;
    engine.set_staff_active(idle.id, false).await.unwrap();

    assert_eq!(engine.zone_capacity(Zone::Hair, feb(1)).await.unwrap(), 2);

    engine.add_day_off(a.id, feb(1), None).await.unwrap();
    assert_eq!(engine.zone_capacity(Zone::Hair, feb(1)).await.unwrap(), 1);
    assert_eq!(engine.zone_capacity(Zone::Hair, feb(2)).await.unwrap(), 2);
}

#[tokio::test]
async fn empty_roster_uses_fallback_capacity() {
    let engine = engine();
    assert_eq!(engine.zone_capacity(Zone::Hair, feb(1)).await.unwrap(), 1);
    assert_eq!(engine.zone_capacity(Zone::Nail, feb(1)).await.unwrap(), 2);

    let engine = engine_with(Settings { nail_capacity: 3, ..Settings::default() });
    assert_eq!(engine.zone_capacity(Zone::Nail, feb(1)).await.unwrap(), 3);

    // Once anyone works the zone, the live count applies.
    add_staff(&engine, StaffRole::Nail).await;
    assert_eq!(engine.zone_capacity(Zone::Nail, feb(1)).await.unwrap(), 1);
}

#[tokio::test]
async fn zone_without_working_staff_is_closed() {
    let engine = engine();
    let only = add_staff(&engine, StaffRole::Hair).await;
    let cut = add_service(&engine, Zone::Hair, "Cut", 30, "08:00", "22:00").await;
    engine.add_day_off(only.id, feb(3), Some("dentist".into())).await.unwrap();

    assert_eq!(engine.zone_capacity(Zone::Hair, feb(3)).await.unwrap(), 0);
    assert_eq!(
        engine.unavailable_times_for(feb(3), Zone::Hair, 30).await.unwrap(),
        SlotGrid::default().labels()
    );
    assert!(matches!(
        engine.submit_booking(draft(vec![cut.id], feb(3), "10:00")).await,
        Err(EngineError::SlotUnavailable { .. })
    ));

    let board = engine.slot_board(feb(3), &[cut.id], morning()).await.unwrap();
    assert!(board.closed);
    assert_eq!(board.capacity, 0);
    assert!(!board.slots.is_empty());
    assert_eq!(board.available_times().count(), 0);
}

// ── Submission checks ────────────────────────────────────

#[tokio::test]
async fn submission_rejects_bad_service_sets() {
    let engine = engine();
    let cut = add_service(&engine, Zone::Hair, "Cut", 30, "08:00", "22:00").await;
    let gel = add_service(&engine, Zone::Nail, "Gel", 60, "08:00", "22:00").await;
    let retired = add_service(&engine, Zone::Hair, "Perm", 180, "09:00", "16:00").await;
    engine.toggle_service_active(retired.id).await.unwrap();

    assert!(matches!(
        engine.submit_booking(draft(vec![cut.id, gel.id], feb(1), "10:00")).await,
        Err(EngineError::MixedZones)
    ));
    assert!(matches!(
        engine.submit_booking(draft(vec![retired.id], feb(1), "10:00")).await,
        Err(EngineError::InactiveService(id)) if id == retired.id
    ));
    assert!(matches!(
        engine.submit_booking(draft(vec![Ulid::new()], feb(1), "10:00")).await,
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.submit_booking(draft(vec![], feb(1), "10:00")).await,
        Err(EngineError::NoServices)
    ));
    assert!(matches!(
        engine.submit_booking(draft(vec![cut.id], feb(1), "25:00")).await,
        Err(EngineError::InvalidTimeFormat(_))
    ));
    assert!(engine.bookings_on(feb(1)).await.unwrap().is_empty());
}

#[tokio::test]
async fn booking_snapshots_services() {
    let engine = engine();
    let cut = add_service(&engine, Zone::Hair, "Cut", 30, "08:00", "22:00").await;
    let wash = add_service(&engine, Zone::Hair, "Wash", 45, "08:00", "22:00").await;

    let mut d = draft(vec![cut.id, wash.id], feb(1), "10:00");
    d.customer_name = "  Ann  ".into();
    d.notes = Some("   ".into());
    let booking = engine.submit_booking(d).await.unwrap();
    assert_eq!(booking.total_duration, 75);
    assert_eq!(booking.zone, Zone::Hair);
    assert_eq!(booking.end_label(), "11:15");
    assert_eq!(booking.customer_name, "Ann");
    assert_eq!(booking.notes, None);

    engine
        .update_service(
            cut.id,
            ServiceDraft {
                name: "Signature cut".into(),
                zone: Zone::Hair,
                duration: 60,
                available_from: "08:00".into(),
                available_to: "22:00".into(),
                is_active: true,
                sort_order: None,
            },
        )
        .await
        .unwrap();

    let stored = engine.booking(booking.id).await.unwrap();
    assert_eq!(stored.services[0].name, "Cut");
    assert_eq!(stored.services[0].duration, 30);
    assert_eq!(stored.total_duration, 75);
}

#[tokio::test]
async fn status_transitions() {
    let engine = engine();
    let cut = add_service(&engine, Zone::Hair, "Cut", 30, "08:00", "22:00").await;
    let booking = engine.submit_booking(draft(vec![cut.id], feb(1), "10:00")).await.unwrap();

    assert!(matches!(
        engine.update_status(booking.id, BookingStatus::Confirmed).await,
        Err(EngineError::InvalidTransition { .. })
    ));

    let done = engine.complete(booking.id).await.unwrap();
    assert_eq!(done.status, BookingStatus::Completed);

    assert!(matches!(
        engine.cancel(booking.id).await,
        Err(EngineError::InvalidTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::Cancelled
        })
    ));
    assert!(matches!(engine.cancel(Ulid::new()).await, Err(EngineError::NotFound(_))));
    assert_eq!(engine.booking(booking.id).await.unwrap().status, BookingStatus::Completed);
}

#[tokio::test]
async fn active_bookings_skip_cancelled() {
    let engine = engine();
    add_staff(&engine, StaffRole::Nail).await;
    add_staff(&engine, StaffRole::Nail).await;
    let gel = add_service(&engine, Zone::Nail, "Gel", 60, "08:00", "22:00").await;

    let late = engine.submit_booking(draft(vec![gel.id], feb(1), "16:00")).await.unwrap();
    let early = engine.submit_booking(draft(vec![gel.id], feb(1), "11:00")).await.unwrap();
    let gone = engine.submit_booking(draft(vec![gel.id], feb(1), "13:00")).await.unwrap();
    engine.cancel(gone.id).await.unwrap();

    let active: Vec<Ulid> = engine
        .active_bookings_on(feb(1))
        .await
        .unwrap()
        .iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(active, vec![early.id, late.id]);
    assert_eq!(engine.bookings_on(feb(1)).await.unwrap().len(), 3);
}

#[tokio::test]
async fn bookings_are_broadcast_per_zone() {
    let engine = engine();
    let cut = add_service(&engine, Zone::Hair, "Cut", 30, "08:00", "22:00").await;
    let mut hair = engine.notify.subscribe(Zone::Hair);
    let mut nail = engine.notify.subscribe(Zone::Nail);

    let booking = engine.submit_booking(draft(vec![cut.id], feb(1), "10:00")).await.unwrap();
    assert_eq!(hair.recv().await.unwrap(), Event::BookingCreated { booking: booking.clone() });

    engine.cancel(booking.id).await.unwrap();
    assert_eq!(
        hair.recv().await.unwrap(),
        Event::BookingStatusChanged { id: booking.id, status: BookingStatus::Cancelled }
    );
    assert!(nail.try_recv().is_err());
}

// ── Slot board ───────────────────────────────────────────

#[tokio::test]
async fn board_fits_service_window() {
    let engine = engine();
    add_staff(&engine, StaffRole::Hair).await;
    let colour = add_service(&engine, Zone::Hair, "Colour", 120, "09:00", "17:00").await;
    let cut = add_service(&engine, Zone::Hair, "Cut", 60, "08:00", "22:00").await;
    engine.submit_booking(draft(vec![cut.id], feb(2), "10:00")).await.unwrap();

    let board = engine.slot_board(feb(2), &[colour.id], morning()).await.unwrap();
    assert_eq!(board.zone, Zone::Hair);
    assert_eq!(board.capacity, 1);
    assert!(!board.closed);
    assert_eq!(board.slots.len(), 13);
    assert_eq!(board.slots.first().unwrap().time, "09:00");
    assert_eq!(board.slots.last().unwrap().time, "15:00");

    let full: Vec<&str> = board
        .slots
        .iter()
        .filter(|s| !s.available)
        .map(|s| s.time.as_str())
        .collect();
    assert_eq!(full, vec!["09:00", "09:30", "10:00", "10:30"]);
    assert_eq!(board.available_times().next(), Some("11:00"));
}

#[tokio::test]
async fn board_narrows_to_shared_window() {
    let engine = engine();
    let wash = add_service(&engine, Zone::Hair, "Wash", 30, "09:00", "19:00").await;
    let perm = add_service(&engine, Zone::Hair, "Perm", 180, "09:00", "16:00").await;

    let board = engine.slot_board(feb(2), &[wash.id, perm.id], morning()).await.unwrap();
    assert_eq!(board.total_duration, 210);
    assert_eq!(board.slots.last().unwrap().time, "12:30");

    assert_eq!(service_window(&[wash, perm]), Some(Span::new(540, 960)));
}

#[tokio::test]
async fn board_skips_times_too_soon_today() {
    let engine = engine();
    let cut = add_service(&engine, Zone::Hair, "Cut", 30, "08:00", "22:00").await;

    let board = engine.slot_board(feb(1), &[cut.id], at(feb(1), 10, 10)).await.unwrap();
    assert_eq!(board.slots.first().unwrap().time, "11:00");

    let board = engine.slot_board(feb(1), &[cut.id], at(feb(1), 10, 30)).await.unwrap();
    assert_eq!(board.slots.first().unwrap().time, "11:00");

    let board = engine.slot_board(feb(2), &[cut.id], at(feb(1), 21, 0)).await.unwrap();
    assert_eq!(board.slots.first().unwrap().time, "08:00");
}

#[tokio::test]
async fn board_respects_horizon() {
    let engine = engine();
    let cut = add_service(&engine, Zone::Hair, "Cut", 30, "08:00", "22:00").await;
    let now = morning();

    assert!(engine.slot_board(feb(14), &[cut.id], now).await.is_ok());
    assert!(matches!(
        engine.slot_board(feb(15), &[cut.id], now).await,
        Err(EngineError::OutsideBookingHorizon(_))
    ));
    assert!(matches!(
        engine.slot_board(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(), &[cut.id], now).await,
        Err(EngineError::OutsideBookingHorizon(_))
    ));
}

#[tokio::test]
async fn board_and_submission_agree() {
    let engine = engine();
    add_staff(&engine, StaffRole::Nail).await;
    add_staff(&engine, StaffRole::Nail).await;
    let gel = add_service(&engine, Zone::Nail, "Gel", 60, "10:00", "20:00").await;
    for time in ["12:00", "12:30", "15:00"] {
        engine.submit_booking(draft(vec![gel.id], feb(2), time)).await.unwrap();
    }

    let board = engine.slot_board(feb(2), &[gel.id], morning()).await.unwrap();
    for slot in &board.slots {
        assert_eq!(
            engine.is_slot_available(feb(2), &slot.time, Zone::Nail, 60).await.unwrap(),
            slot.available,
            "slot {}",
            slot.time
        );
    }
}

// ── Online booking ───────────────────────────────────────

#[tokio::test]
async fn online_booking_checks() {
    let engine = engine();
    add_staff(&engine, StaffRole::Hair).await;
    let colour = add_service(&engine, Zone::Hair, "Colour", 120, "09:00", "17:00").await;

    let mut d = draft(vec![colour.id], feb(2), "10:00");
    d.customer_phone = "021234567".into();
    assert!(matches!(
        engine.book_online(d, morning()).await,
        Err(EngineError::InvalidPhone(_))
    ));

    // Would not finish before the service window closes.
    let d = draft(vec![colour.id], feb(2), "15:30");
    assert!(matches!(
        engine.book_online(d, morning()).await,
        Err(EngineError::SlotUnavailable { .. })
    ));

    let d = draft(vec![colour.id], feb(20), "10:00");
    assert!(matches!(
        engine.book_online(d, morning()).await,
        Err(EngineError::OutsideBookingHorizon(_))
    ));

    let booking = engine
        .book_online(draft(vec![colour.id], feb(2), "10:00"), morning())
        .await
        .unwrap();
    assert_eq!(booking.channel, Channel::Web);

    assert!(matches!(
        engine.book_online(draft(vec![colour.id], feb(2), "11:00"), morning()).await,
        Err(EngineError::SlotUnavailable { .. })
    ));
    assert_eq!(engine.bookings_on(feb(2)).await.unwrap().len(), 1);
}

// ── Catalog ──────────────────────────────────────────────

#[tokio::test]
async fn catalog_ranks_and_toggles() {
    let engine = engine();
    let a = add_service(&engine, Zone::Nail, "A", 30, "10:00", "20:00").await;
    let b = add_service(&engine, Zone::Nail, "B", 30, "10:00", "20:00").await;
    let c = add_service(&engine, Zone::Nail, "C", 30, "10:00", "20:00").await;
    let h = add_service(&engine, Zone::Hair, "H", 30, "09:00", "19:00").await;
    assert_eq!((a.sort_order, b.sort_order, c.sort_order, h.sort_order), (1, 2, 3, 1));

    let ranked = engine.reorder_services(Zone::Nail, &[c.id, a.id]).await.unwrap();
    let rank_of = |id: Ulid| ranked.iter().find(|s| s.id == id).map(|s| s.sort_order);
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].id, c.id);
    assert_eq!((rank_of(c.id), rank_of(a.id), rank_of(b.id)), (Some(1), Some(2), Some(2)));

    assert!(matches!(
        engine.reorder_services(Zone::Nail, &[h.id]).await,
        Err(EngineError::NotFound(_))
    ));

    engine.toggle_service_active(a.id).await.unwrap();
    let active: Vec<Ulid> = engine
        .active_services(Zone::Nail)
        .await
        .unwrap()
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(active, vec![c.id, b.id]);
    assert_eq!(engine.services().await.unwrap().len(), 4);

    let back = engine.toggle_service_active(a.id).await.unwrap();
    assert!(back.is_active);
}

#[tokio::test]
async fn service_drafts_are_validated() {
    let engine = engine();
    let bad_window = ServiceDraft {
        name: "Late".into(),
        zone: Zone::Hair,
        duration: 30,
        available_from: "19:00".into(),
        available_to: "09:00".into(),
        is_active: true,
        sort_order: None,
    };
    assert!(matches!(
        engine.add_service(bad_window.clone()).await,
        Err(EngineError::InvalidWindow { .. })
    ));
    assert!(matches!(
        engine.add_service(ServiceDraft { duration: 0, ..bad_window.clone() }).await,
        Err(EngineError::InvalidDuration(0))
    ));
    assert!(matches!(
        engine.update_service(Ulid::new(), ServiceDraft { available_to: "21:00".into(), ..bad_window }).await,
        Err(EngineError::NotFound(_))
    ));
    assert!(engine.services().await.unwrap().is_empty());
}

#[tokio::test]
async fn default_catalog_is_seeded_once() {
    let engine = engine();
    assert_eq!(engine.seed_default_services().await.unwrap(), 12);
    assert_eq!(engine.seed_default_services().await.unwrap(), 0);

    let hair = engine.active_services(Zone::Hair).await.unwrap();
    let nail = engine.active_services(Zone::Nail).await.unwrap();
    assert_eq!(hair.len(), 5);
    assert_eq!(nail.len(), 6);
    assert_eq!(hair[0].name, "Haircut");
    assert_eq!(hair[0].window(), Span::new(540, 1140));
    assert_eq!(nail.iter().map(|s| s.sort_order).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
}

// ── Staff and day-offs ───────────────────────────────────

#[tokio::test]
async fn day_off_records() {
    let engine = engine();
    let s = add_staff(&engine, StaffRole::Nail).await;

    assert!(matches!(
        engine.add_day_off(Ulid::new(), feb(1), None).await,
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.add_day_off(s.id, feb(1), Some("x".repeat(MAX_NOTE_LEN + 1))).await,
        Err(EngineError::LimitExceeded(_))
    ));

    engine.add_day_off(s.id, feb(4), Some("holiday".into())).await.unwrap();
    engine.add_day_off(s.id, feb(1), None).await.unwrap();
    assert!(matches!(
        engine.add_day_off(s.id, feb(1), None).await,
        Err(EngineError::AlreadyExists(_))
    ));

    let dates: Vec<NaiveDate> =
        engine.day_offs_for(s.id).await.unwrap().iter().map(|d| d.date).collect();
    assert_eq!(dates, vec![feb(1), feb(4)]);

    engine.remove_day_off(s.id, feb(1)).await.unwrap();
    assert!(matches!(
        engine.remove_day_off(s.id, feb(1)).await,
        Err(EngineError::NotFound(_))
    ));
    assert_eq!(engine.day_offs_for(s.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn staff_updates_keep_activity() {
    let engine = engine();
    let s = add_staff(&engine, StaffRole::Hair).await;
    engine.set_staff_active(s.id, false).await.unwrap();

    let moved = engine
        .update_staff(
            s.id,
            StaffDraft {
                name: "Bee".into(),
                phone: "0811111111".into(),
                email: Some("bee@example.com".into()),
                role: StaffRole::Nail,
                salary_base: 15_000,
                commission_enabled: false,
            },
        )
        .await
        .unwrap();
    assert!(!moved.is_active);
    assert_eq!(moved.role, StaffRole::Nail);
    assert_eq!(engine.staff().await.unwrap(), vec![moved]);

    assert!(matches!(
        engine.set_staff_active(Ulid::new(), true).await,
        Err(EngineError::NotFound(_))
    ));
}

// ── Journal-backed engine ────────────────────────────────

#[tokio::test]
async fn engine_state_survives_restart() {
    let path = test_journal_path("restart.wal");
    let booking_id;
    let staff_id;
    {
        let store = Arc::new(MemoryStore::open(&path).unwrap());
        let engine = Engine::new(store, Arc::new(NotifyHub::new()), Settings::default());
        engine.seed_default_services().await.unwrap();
        staff_id = add_staff(&engine, StaffRole::Hair).await.id;
        engine.add_day_off(staff_id, feb(5), None).await.unwrap();
        let cut = engine.active_services(Zone::Hair).await.unwrap()[0].clone();
        let booking = engine.submit_booking(draft(vec![cut.id], feb(1), "10:00")).await.unwrap();
        engine.complete(booking.id).await.unwrap();
        booking_id = booking.id;
    }

    let store = Arc::new(MemoryStore::open(&path).unwrap());
    let engine = Engine::new(store, Arc::new(NotifyHub::new()), Settings::default());
    assert_eq!(engine.seed_default_services().await.unwrap(), 0);
    assert_eq!(engine.services().await.unwrap().len(), 12);
    assert_eq!(engine.booking(booking_id).await.unwrap().status, BookingStatus::Completed);
    assert_eq!(engine.zone_capacity(Zone::Hair, feb(5)).await.unwrap(), 0);
    assert_eq!(engine.zone_capacity(Zone::Hair, feb(1)).await.unwrap(), 1);
    assert!(!engine.is_slot_available(feb(1), "10:00", Zone::Hair, 30).await.unwrap());
}
