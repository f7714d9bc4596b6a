//! Integration tests for the allocator: conservation, ticket numbering,
//! idempotent release, exhaustion, fees and concurrent use.

use parkinglot_gateway::domain::{LotError, Spot, Ticket, VehicleClass};
use parkinglot_gateway::services::{FeeSchedule, LotCapacity, ParkingLot};
use std::collections::HashSet;
use std::sync::Arc;

fn create_lot(small: usize, medium: usize, large: usize) -> ParkingLot {
    ParkingLot::new(LotCapacity::new(small, medium, large), FeeSchedule::default())
}

#[test]
fn test_sequence_numbers_global_across_classes() {
    let lot = create_lot(10, 5, 2);
    assert_eq!(lot.park(VehicleClass::Car).unwrap().sequence(), 0);
    assert_eq!(lot.park(VehicleClass::Bike).unwrap().sequence(), 1);
    assert_eq!(lot.park(VehicleClass::Truck).unwrap().sequence(), 2);
}

#[test]
fn test_park_three_cars_then_full_then_release_all() {
    let lot = create_lot(0, 3, 0);
    let tickets: Vec<Ticket> = (0..3).map(|_| lot.park(VehicleClass::Car).unwrap()).collect();
    assert_eq!(tickets.iter().map(|t| t.sequence()).collect::<Vec<_>>(), vec![0, 1, 2]);

    let err = lot.park(VehicleClass::Car).unwrap_err();
    assert!(matches!(err, LotError::LotFull { class: VehicleClass::Car, occupied: 3 }));
    assert_eq!(lot.total_spot_count(), 3);

    // First ticket released twice, as a careless caller would
    lot.release(&tickets[0]).unwrap();
    lot.release(&tickets[0]).unwrap();
    lot.release(&tickets[1]).unwrap();
    lot.release(&tickets[2]).unwrap();

    assert_eq!(lot.total_spot_count(), 3);
    assert_eq!(lot.available_count(VehicleClass::Car), 3);
}

#[test]
fn test_exhaustion_leaves_counts_unchanged() {
    for n in [0usize, 1, 4] {
        let lot = create_lot(n, 0, 0);
        for _ in 0..n {
            lot.park(VehicleClass::Bike).unwrap();
        }
        let before = lot.occupancy();
        assert!(matches!(lot.park(VehicleClass::Bike), Err(LotError::LotFull { .. })));
        assert_eq!(lot.occupancy(), before);
    }
}

#[test]
fn test_release_idempotent_receipts() {
    let lot = create_lot(2, 2, 2);
    let ticket = lot.park(VehicleClass::Truck).unwrap();
    let first = lot.release(&ticket).unwrap();
    let total = lot.total_spot_count();
    let second = lot.release(&ticket).unwrap();

    assert_eq!(first.charge(), second.charge());
    assert_eq!(first.class(), VehicleClass::Truck);
    assert_eq!(lot.total_spot_count(), total);
}

#[test]
fn test_fees_base_100() {
    let lot = create_lot(10, 5, 2);
    let car = lot.release(&lot.park(VehicleClass::Car).unwrap()).unwrap();
    let truck = lot.release(&lot.park(VehicleClass::Truck).unwrap()).unwrap();
    let bike = lot.release(&lot.park(VehicleClass::Bike).unwrap()).unwrap();

    assert_eq!(car.charge(), 200);
    assert_eq!(truck.charge(), 300);
    assert_eq!(bike.charge(), 100);
    assert_eq!(truck.charge(), bike.charge() * 3);
    assert_eq!(car.charge(), bike.charge() * 2);
}

#[test]
fn test_invalid_ticket_leaves_count() {
    let lot = create_lot(0, 2, 0);
    lot.park(VehicleClass::Car).unwrap();
    lot.park(VehicleClass::Car).unwrap();

    let forged = Ticket::new(0, Spot::new(VehicleClass::Car), VehicleClass::Car);
    assert!(matches!(lot.release(&forged), Err(LotError::InvalidTicket { .. })));
    assert_eq!(lot.total_spot_count(), 2);
    assert_eq!(lot.occupied_count(VehicleClass::Car), 2);
}

#[test]
fn test_conservation_over_mixed_sequence() {
    let lot = create_lot(3, 3, 3);
    let mut held = Vec::new();
    for round in 0..50usize {
        let class = VehicleClass::ALL[round % 3];
        match lot.park(class) {
            Ok(ticket) => held.push(ticket),
            Err(LotError::LotFull { .. }) => {
                let ticket = held.remove(round % held.len());
                lot.release(&ticket).unwrap();
                lot.release(&ticket).unwrap();
            }
            Err(e) => panic!("unexpected {:?}", e),
        }
        assert_eq!(lot.total_spot_count(), 9);
        assert_eq!(lot.occupancy().total(), 9);
    }
}

#[test]
fn test_concurrent_parks_never_share_a_spot() {
    const THREADS: usize = 8;
    const SPOTS: usize = 64;

    let lot = Arc::new(create_lot(0, SPOTS, 0));
    let results: Vec<Vec<Result<Ticket, LotError>>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let lot = lot.clone();
                s.spawn(move || (0..SPOTS).map(|_| lot.park(VehicleClass::Car)).collect::<Vec<_>>())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut spots = HashSet::new();
    let mut sequences = HashSet::new();
    let mut full = 0usize;
    for per_thread in &results {
        let mut last = None;
        for result in per_thread {
            match result {
                Ok(ticket) => {
                    assert!(spots.insert(ticket.spot().id()), "spot handed out twice");
                    assert!(sequences.insert(ticket.sequence()), "sequence reused");
                    if let Some(prev) = last {
                        assert!(ticket.sequence() > prev);
                    }
                    last = Some(ticket.sequence());
                }
                Err(LotError::LotFull { .. }) => full += 1,
                Err(e) => panic!("unexpected {:?}", e),
            }
        }
    }

    assert_eq!(spots.len(), SPOTS);
    assert_eq!(full, THREADS * SPOTS - SPOTS);
    assert_eq!(sequences, (0..SPOTS as u64).collect::<HashSet<_>>());
    assert_eq!(lot.total_spot_count(), SPOTS);
}

#[test]
fn test_concurrent_double_release_frees_once() {
    let lot = Arc::new(create_lot(0, 0, 16));
    let tickets: Vec<Ticket> = (0..16).map(|_| lot.park(VehicleClass::Truck).unwrap()).collect();

    std::thread::scope(|s| {
        for _ in 0..4 {
            let lot = lot.clone();
            let tickets = &tickets;
            s.spawn(move || {
                for ticket in tickets {
                    assert_eq!(lot.release(ticket).unwrap().charge(), 300);
                }
            });
        }
    });

    assert_eq!(lot.available_count(VehicleClass::Truck), 16);
    assert_eq!(lot.occupied_count(VehicleClass::Truck), 0);
    assert_eq!(lot.total_spot_count(), 16);
}

#[test]
fn test_concurrent_park_release_mix_conserves_spots() {
    const THREADS: usize = 6;
    const ROUNDS: usize = 500;
    let capacity = LotCapacity::new(3, 4, 2);

    let lot = Arc::new(ParkingLot::new(capacity, FeeSchedule::default()));
    let per_thread: Vec<Vec<u64>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let lot = lot.clone();
                s.spawn(move || {
                    let mut sequences = Vec::new();
                    for round in 0..ROUNDS {
                        let class = VehicleClass::ALL[(t + round) % VehicleClass::ALL.len()];
                        match lot.park(class) {
                            Ok(ticket) => {
                                sequences.push(ticket.sequence());
                                let first = lot.release(&ticket).unwrap();
                                let second = lot.release(&ticket).unwrap();
                                assert_eq!(first, second);
                            }
                            Err(LotError::LotFull { .. }) => {}
                            Err(e) => panic!("unexpected {:?}", e),
                        }
                        if round % 7 == 0 {
                            let forged = Ticket::new(u64::MAX - round as u64, Spot::new(class), class);
                            assert!(matches!(lot.release(&forged), Err(LotError::InvalidTicket { .. })));
                        }
                        assert_eq!(lot.total_spot_count(), capacity.total());
                    }
                    sequences
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut seen = HashSet::new();
    for sequences in &per_thread {
        assert!(sequences.windows(2).all(|w| w[0] < w[1]), "sequence went backwards");
        for &sequence in sequences {
            assert!(seen.insert(sequence), "sequence {} issued twice", sequence);
        }
    }
    assert!(!seen.is_empty());

    assert_eq!(lot.total_spot_count(), capacity.total());
    for class in VehicleClass::ALL {
        assert_eq!(
            lot.available_count(class) + lot.occupied_count(class),
            capacity.for_class(class)
        );
        assert_eq!(lot.occupied_count(class), 0);
    }
}
