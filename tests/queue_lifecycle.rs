//! Argument lifetime and drain-once behavior of the event queue

mod common;

use common::{init_logging, Counted};
use eventq::EventQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

#[test]
fn test_queued_arguments_freed_after_process() {
    init_logging();
    let queue: EventQueue<i32, Arc<i32>> = EventQueue::new();
    let mut observers: Vec<Weak<i32>> = Vec::new();

    for n in 1..=3 {
        let value = Arc::new(n);
        observers.push(Arc::downgrade(&value));
        queue.enqueue(n, value);
    }
    assert!(observers.iter().all(|w| w.upgrade().is_some()));

    queue.process().unwrap();
    assert!(observers.iter().all(|w| w.upgrade().is_none()));
}

#[test]
fn test_queued_arguments_freed_on_queue_drop() {
    init_logging();
    let queue: EventQueue<i32, Arc<i32>> = EventQueue::new();
    let mut observers: Vec<Weak<i32>> = Vec::new();

    for n in 1..=3 {
        let value = Arc::new(n);
        observers.push(Arc::downgrade(&value));
        queue.enqueue(n, value);
    }
    assert!(observers.iter().all(|w| w.upgrade().is_some()));

    drop(queue);
    assert!(observers.iter().all(|w| w.upgrade().is_none()));
}

fn counted_queue(cells: &Arc<Mutex<Vec<i32>>>) -> EventQueue<usize, Counted> {
    let queue: EventQueue<usize, Counted> = EventQueue::new();
    for index in 0..4 {
        queue.enqueue(index, Counted::new(index, cells));
    }
    queue
}

#[test]
fn test_no_double_free_after_process() {
    init_logging();
    let cells = Arc::new(Mutex::new(vec![0; 4]));
    let queue = counted_queue(&cells);
    assert_eq!(*cells.lock().unwrap(), vec![1, 1, 1, 1]);

    queue.process().unwrap();
    assert_eq!(*cells.lock().unwrap(), vec![0, 0, 0, 0]);
}

#[test]
fn test_no_double_free_after_queue_drop() {
    init_logging();
    let cells = Arc::new(Mutex::new(vec![0; 4]));
    let queue = counted_queue(&cells);
    assert_eq!(*cells.lock().unwrap(), vec![1, 1, 1, 1]);

    drop(queue);
    assert_eq!(*cells.lock().unwrap(), vec![0, 0, 0, 0]);
}

#[test]
fn test_argument_capture_isolated_from_producer() {
    init_logging();
    let queue: EventQueue<i32, String> = EventQueue::new();
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let observed = Arc::clone(&seen);
    queue.append_listener(1, move |message: &String| {
        observed.lock().unwrap().push(message.clone());
        Ok(())
    });

    let mut message = String::from("first");
    queue.enqueue(1, message.clone());
    // mutating the producer's copy after enqueue must not be observable
    message.clear();
    message.push_str("mangled");

    queue.process().unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["first".to_string()]);
}

#[test]
fn test_take_all_then_process_dispatches_nothing() {
    init_logging();
    let queue: EventQueue<i32, Arc<i32>> = EventQueue::new();
    let hits = Arc::new(AtomicUsize::new(0));

    let counted = Arc::clone(&hits);
    queue.append_listener(3, move |_| {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    for n in 0..3 {
        queue.enqueue(3, Arc::new(n));
    }
    for _ in 0..3 {
        assert!(queue.take_event().is_some());
    }
    assert!(queue.peek_event().is_none());
    assert!(queue.take_event().is_none());

    queue.process().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_each_record_dispatched_exactly_once() {
    init_logging();
    let queue: EventQueue<i32, usize> = EventQueue::new();
    let tally = Arc::new(Mutex::new(vec![0u32; 10]));

    let cells = Arc::clone(&tally);
    queue.append_listener(1, move |index: &usize| {
        cells.lock().unwrap()[*index] += 1;
        Ok(())
    });

    for index in 0..10 {
        queue.enqueue(1, index);
    }

    // Mix manual draining with bulk processing: 0 and 1 via take/dispatch,
    // the rest via process.
    for _ in 0..2 {
        let record = queue.take_event().unwrap();
        queue.dispatch(&record).unwrap();
    }
    assert_eq!(queue.process().unwrap(), 8);

    assert_eq!(*tally.lock().unwrap(), vec![1; 10]);
    assert!(queue.is_empty());
}

#[test]
fn test_peek_then_take_then_peek_advances() {
    init_logging();
    let queue: EventQueue<i32, Arc<i32>> = EventQueue::new();
    for n in 0..3 {
        queue.enqueue(3, Arc::new(n));
    }

    let peeked = queue.peek_event().unwrap();
    assert_eq!(*peeked.args, 0);

    let taken = queue.take_event().unwrap();
    assert_eq!(*taken.args, 0);

    let peeked = queue.peek_event().unwrap();
    assert_eq!(*peeked.args, 1);
}

#[test]
fn test_dispatch_after_take_matches_peeked_record() {
    init_logging();
    let queue: EventQueue<i32, Arc<i32>> = EventQueue::new();
    let sum = Arc::new(AtomicUsize::new(0));

    let total = Arc::clone(&sum);
    queue.append_listener(3, move |value: &Arc<i32>| {
        total.fetch_add(**value as usize, Ordering::SeqCst);
        Ok(())
    });

    queue.enqueue(3, Arc::new(5));
    queue.enqueue(3, Arc::new(7));

    let peeked = queue.peek_event().unwrap();
    let taken = queue.take_event().unwrap();
    assert_eq!(peeked.args, taken.args);

    queue.dispatch(&taken).unwrap();
    assert_eq!(sum.load(Ordering::SeqCst), 5);

    // the peeked copy can be dispatched independently
    queue.dispatch(&peeked).unwrap();
    assert_eq!(sum.load(Ordering::SeqCst), 10);

    queue.process().unwrap();
    assert_eq!(sum.load(Ordering::SeqCst), 17);
}
