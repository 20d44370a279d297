//! Pairing of directional bookings into intervals.
//!
//! Work and break bookings are paired separately. Bookings that already carry
//! a `pair_id` are matched first; the rest are paired in time order. The
//! day-change policy decides what happens to an arrival left open at the end
//! of the day and to a departure that precedes every arrival.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    Booking, BookingCategory, BookingDirection, DayChangeBehavior, ErrorCode, WarningCode,
};

use super::time_value::{MINUTES_PER_DAY, TimeInterval};

/// One end of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairEndpoint {
    /// The booking this endpoint came from.
    pub booking_id: Uuid,
    /// Booked (edited) time, relative to the calculated day.
    pub booked: i32,
    /// Time after tolerance, rounding and capping, relative to the calculated day.
    pub calculated: i32,
    /// Minutes added to the booking's own time to express it on the
    /// calculated day (`1440` for a next-day booking, `-1440` for a
    /// previous-day booking).
    pub offset: i32,
}

impl PairEndpoint {
    /// An endpoint for a booking of the calculated day.
    pub fn new(booking_id: Uuid, time: i32) -> Self {
        Self::with_offset(booking_id, time, 0)
    }

    fn with_offset(booking_id: Uuid, time: i32, offset: i32) -> Self {
        Self {
            booking_id,
            booked: time + offset,
            calculated: time + offset,
            offset,
        }
    }

    /// The calculated time on the booking's own date.
    pub fn calculated_on_booking_date(&self) -> i32 {
        self.calculated - self.offset
    }
}

/// An arrival matched with its departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPair {
    /// Work or break.
    pub category: BookingCategory,
    /// The arrival (or break start).
    pub come: PairEndpoint,
    /// The departure (or break end).
    pub go: PairEndpoint,
}

impl BookingPair {
    fn from_bookings(come: &Booking, go: &Booking) -> Self {
        Self {
            category: come.category,
            come: PairEndpoint::new(come.id, come.edited_time),
            go: PairEndpoint::new(go.id, go.edited_time),
        }
    }

    /// The calculated interval of the pair.
    pub fn interval(&self) -> TimeInterval {
        TimeInterval::new(self.come.calculated, self.go.calculated)
    }

    /// The booked interval of the pair.
    pub fn booked_interval(&self) -> TimeInterval {
        TimeInterval::new(self.come.booked, self.go.booked)
    }
}

/// The bookings relevant for one calculated day.
///
/// `previous` and `next` are only consulted when the day-change policy is not
/// [`DayChangeBehavior::None`].
#[derive(Debug, Clone, Default)]
pub struct DayBookings {
    /// Bookings of the day before.
    pub previous: Vec<Booking>,
    /// Bookings of the calculated day.
    pub current: Vec<Booking>,
    /// Bookings of the day after.
    pub next: Vec<Booking>,
}

impl DayBookings {
    /// Bookings of the calculated day only.
    pub fn same_day(current: Vec<Booking>) -> Self {
        Self {
            current,
            ..Self::default()
        }
    }
}

/// Result of pairing one day.
#[derive(Debug, Clone, Default)]
pub struct PairingResult {
    /// Complete work pairs, sorted by arrival.
    pub work_pairs: Vec<BookingPair>,
    /// Complete break pairs, sorted by start.
    pub break_pairs: Vec<BookingPair>,
    /// Bookings left without a partner.
    pub unpaired: Vec<Uuid>,
    /// Pairing violations.
    pub errors: BTreeSet<ErrorCode>,
    /// Day-change notices.
    pub warnings: BTreeSet<WarningCode>,
    /// Synthetic bookings to persist (auto-complete), possibly for the next day.
    pub synthetic: Vec<Booking>,
    /// Number of bookings evaluated for the day, including synthetic ones.
    pub booking_count: u32,
}

impl PairingResult {
    /// Returns true when the day had neither work nor break bookings.
    pub fn is_empty(&self) -> bool {
        self.booking_count == 0
    }
}

/// Sort order: by time, departures before arrivals at the same minute so a
/// back-to-back `out 12:00, in 12:00` closes the first pair.
fn sort_key(booking: &Booking) -> (i32, u8) {
    let direction = match booking.direction {
        BookingDirection::Out => 0,
        BookingDirection::In => 1,
    };
    (booking.edited_time, direction)
}

fn sorted_of_category(bookings: &[Booking], category: BookingCategory) -> Vec<&Booking> {
    let mut selected: Vec<&Booking> = bookings
        .iter()
        .filter(|booking| booking.category == category)
        .collect();
    selected.sort_by_key(|booking| sort_key(booking));
    selected
}

struct Sequenced<'a> {
    pairs: Vec<BookingPair>,
    leading_out: Option<&'a Booking>,
    trailing_in: Option<&'a Booking>,
    unmatched_in: Vec<Uuid>,
    unmatched_out: Vec<Uuid>,
}

/// Matches explicit `pair_id` links, then pairs the remainder in time order.
fn pair_sequence<'a>(sorted: &[&'a Booking]) -> Sequenced<'a> {
    let mut pairs = Vec::new();
    let mut linked: BTreeSet<Uuid> = BTreeSet::new();

    for come in sorted.iter().filter(|b| b.direction == BookingDirection::In) {
        let Some(pair_id) = come.pair_id else {
            continue;
        };
        let partner = sorted.iter().find(|go| {
            go.direction == BookingDirection::Out
                && go.pair_id == Some(pair_id)
                && go.edited_time >= come.edited_time
                && !linked.contains(&go.id)
        });
        if let Some(go) = partner {
            linked.insert(come.id);
            linked.insert(go.id);
            pairs.push(BookingPair::from_bookings(come, go));
        }
    }

    let mut open: Option<&'a Booking> = None;
    let mut seen_in = false;
    let mut leading_out = None;
    let mut unmatched_in = Vec::new();
    let mut unmatched_out = Vec::new();

    for &booking in sorted.iter().filter(|b| !linked.contains(&b.id)) {
        match booking.direction {
            BookingDirection::In => {
                if let Some(previous) = open.replace(booking) {
                    unmatched_in.push(previous.id);
                }
                seen_in = true;
            }
            BookingDirection::Out => match open.take() {
                Some(come) => pairs.push(BookingPair::from_bookings(come, booking)),
                None if !seen_in && leading_out.is_none() => leading_out = Some(booking),
                None => unmatched_out.push(booking.id),
            },
        }
    }

    pairs.sort_by_key(|pair| (pair.come.booked, pair.go.booked));
    Sequenced {
        pairs,
        leading_out,
        trailing_in: open,
        unmatched_in,
        unmatched_out,
    }
}

/// The last work booking of a day, if it is an arrival left open.
fn open_arrival(bookings: &[Booking]) -> Option<&Booking> {
    sorted_of_category(bookings, BookingCategory::Work)
        .last()
        .copied()
        .filter(|booking| booking.direction == BookingDirection::In)
}

/// The first work booking of a day, if it is a departure.
fn leading_departure(bookings: &[Booking]) -> Option<&Booking> {
    sorted_of_category(bookings, BookingCategory::Work)
        .first()
        .copied()
        .filter(|booking| booking.direction == BookingDirection::Out)
}

/// Pairs the bookings of `date` for `employee_id` under the given
/// day-change policy.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::{pair_bookings, DayBookings};
/// use attendance_engine::models::{
///     Booking, BookingCategory, BookingDirection, BookingSource, DayChangeBehavior,
/// };
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let employee = Uuid::new_v4();
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let book = |direction, time| {
///     Booking::new(employee, date, direction, BookingCategory::Work, time, BookingSource::Terminal)
/// };
///
/// let day = DayBookings::same_day(vec![
///     book(BookingDirection::In, 480),
///     book(BookingDirection::Out, 720),
///     book(BookingDirection::In, 750),
///     book(BookingDirection::Out, 1020),
/// ]);
/// let result = pair_bookings(employee, date, &day, DayChangeBehavior::None);
/// assert_eq!(result.work_pairs.len(), 2);
/// assert!(result.errors.is_empty());
/// ```
pub fn pair_bookings(
    employee_id: Uuid,
    date: NaiveDate,
    bookings: &DayBookings,
    policy: DayChangeBehavior,
) -> PairingResult {
    let mut result = PairingResult {
        booking_count: bookings.current.len() as u32,
        ..PairingResult::default()
    };

    let breaks = pair_sequence(&sorted_of_category(&bookings.current, BookingCategory::Break));
    result.break_pairs = breaks.pairs;
    for id in breaks
        .unmatched_in
        .into_iter()
        .chain(breaks.trailing_in.map(|booking| booking.id))
    {
        result.unpaired.push(id);
        result.errors.insert(ErrorCode::MissingGo);
    }
    for id in breaks
        .unmatched_out
        .into_iter()
        .chain(breaks.leading_out.map(|booking| booking.id))
    {
        result.unpaired.push(id);
        result.errors.insert(ErrorCode::MissingCome);
    }

    let work = pair_sequence(&sorted_of_category(&bookings.current, BookingCategory::Work));
    result.work_pairs = work.pairs;
    for id in work.unmatched_in {
        result.unpaired.push(id);
        result.errors.insert(ErrorCode::MissingGo);
    }
    for id in work.unmatched_out {
        result.unpaired.push(id);
        result.errors.insert(ErrorCode::MissingCome);
    }

    if let Some(come) = work.trailing_in {
        resolve_open_arrival(&mut result, employee_id, date, come, bookings, policy);
    }
    if let Some(go) = work.leading_out {
        resolve_leading_departure(&mut result, go, bookings, policy);
    }

    if result
        .work_pairs
        .iter()
        .any(|pair| pair.booked_interval().crosses_midnight())
    {
        result.warnings.insert(WarningCode::CrossMidnight);
    }
    if closes_on_midnight_correction(&result.work_pairs, &bookings.current) {
        result.warnings.insert(WarningCode::DayChangeAutoCompleted);
    }
    result
        .work_pairs
        .sort_by_key(|pair| (pair.come.booked, pair.go.booked));
    result
}

/// Whether a work pair starts or ends on a midnight booking written by an
/// earlier auto-complete run.
fn closes_on_midnight_correction(pairs: &[BookingPair], current: &[Booking]) -> bool {
    let is_midnight_correction = |id: Uuid| {
        current.iter().any(|booking| {
            booking.id == id
                && booking.system_generated
                && booking.category == BookingCategory::Work
                && match booking.direction {
                    BookingDirection::Out => booking.original_time == MINUTES_PER_DAY,
                    BookingDirection::In => booking.original_time == 0,
                }
        })
    };
    pairs.iter().any(|pair| {
        is_midnight_correction(pair.come.booking_id) || is_midnight_correction(pair.go.booking_id)
    })
}

fn resolve_open_arrival(
    result: &mut PairingResult,
    employee_id: Uuid,
    date: NaiveDate,
    come: &Booking,
    bookings: &DayBookings,
    policy: DayChangeBehavior,
) {
    let next_departure = match policy {
        DayChangeBehavior::None => None,
        _ => leading_departure(&bookings.next),
    };
    let Some(go) = next_departure else {
        result.unpaired.push(come.id);
        result.errors.insert(ErrorCode::MissingGo);
        return;
    };

    match policy {
        DayChangeBehavior::None => {}
        DayChangeBehavior::AtArrival => {
            result.work_pairs.push(BookingPair {
                category: BookingCategory::Work,
                come: PairEndpoint::new(come.id, come.edited_time),
                go: PairEndpoint::with_offset(go.id, go.edited_time, MINUTES_PER_DAY),
            });
        }
        DayChangeBehavior::AtDeparture => {
            result.warnings.insert(WarningCode::AttributedToAdjacentDay);
        }
        DayChangeBehavior::AutoComplete => {
            let closing = Booking::system_correction(
                employee_id,
                date,
                BookingDirection::Out,
                MINUTES_PER_DAY,
            );
            let next_date = date.succ_opt().unwrap_or(date);
            let opening =
                Booking::system_correction(employee_id, next_date, BookingDirection::In, 0);
            result.work_pairs.push(BookingPair::from_bookings(come, &closing));
            result.booking_count += 1;
            result.synthetic.push(closing);
            result.synthetic.push(opening);
            result.warnings.insert(WarningCode::DayChangeAutoCompleted);
        }
    }
}

fn resolve_leading_departure(
    result: &mut PairingResult,
    go: &Booking,
    bookings: &DayBookings,
    policy: DayChangeBehavior,
) {
    let previous_arrival = match policy {
        DayChangeBehavior::AtArrival | DayChangeBehavior::AtDeparture => {
            open_arrival(&bookings.previous)
        }
        // Auto-complete closes the previous day itself; until that has run
        // the departure has no partner here.
        DayChangeBehavior::None | DayChangeBehavior::AutoComplete => None,
    };
    let Some(come) = previous_arrival else {
        result.unpaired.push(go.id);
        result.errors.insert(ErrorCode::MissingCome);
        return;
    };

    if policy == DayChangeBehavior::AtDeparture {
        result.work_pairs.push(BookingPair {
            category: BookingCategory::Work,
            come: PairEndpoint::with_offset(come.id, come.edited_time, -MINUTES_PER_DAY),
            go: PairEndpoint::new(go.id, go.edited_time),
        });
    } else {
        result.warnings.insert(WarningCode::AttributedToAdjacentDay);
    }
}
