use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    Booking, BookingDetails, BookingFilter, BookingStatus, Hotel, HotelFilter, HotelStatus, PaymentStatus,
    Room, RoomFilter, RoomStatus, SortDirection, Transaction, User,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

const BOOKING_COLUMNS: &str = "b.id, b.user_id, b.hotel_id, b.room_id, b.booking_status, b.payment_status, \
     b.check_in_date, b.check_out_date, b.total_guests, b.total_amount, b.transaction_id, b.created_at, b.updated_at";

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn fmt_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

fn parse_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok())
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn where_clause(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    }
}

// ── Users ──

const USER_COLUMNS: &str = "u.id, u.first_name, u.last_name, u.email, u.contact_number, u.created_at";

pub fn insert_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, first_name, last_name, email, contact_number, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id,
            user.first_name,
            user.last_name,
            user.email,
            user.contact_number,
            fmt_ts(&user.created_at),
        ],
    )?;
    Ok(())
}

fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let created_at: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        contact_number: row.get(4)?,
        created_at: parse_ts(&created_at),
    })
}

pub fn get_user(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
            params![id],
            parse_user_row,
        )
        .optional()?;
    Ok(user)
}

/// Every guest who has booked at the hotel, once each.
pub fn list_hotel_guests(conn: &Connection, hotel_id: &str) -> anyhow::Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT {USER_COLUMNS} FROM users u
         JOIN bookings b ON b.user_id = u.id
         WHERE b.hotel_id = ?1
         ORDER BY u.first_name ASC, u.last_name ASC"
    ))?;
    let rows = stmt.query_map(params![hotel_id], parse_user_row)?;

    let mut users = vec![];
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

// ── Hotels ──

const HOTEL_COLUMNS: &str =
    "h.id, h.name, h.city, h.address, h.contact_number, h.description, h.status, h.created_at, h.updated_at";

pub fn insert_hotel(conn: &Connection, hotel: &Hotel) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO hotels (id, name, city, address, contact_number, description, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            hotel.id,
            hotel.name,
            hotel.city,
            hotel.address,
            hotel.contact_number,
            hotel.description,
            hotel.status.as_str(),
            fmt_ts(&hotel.created_at),
            fmt_ts(&hotel.updated_at),
        ],
    )?;
    Ok(())
}

/// Writes every editable hotel field back and stamps `updated_at`.
pub fn save_hotel(conn: &Connection, hotel: &mut Hotel) -> anyhow::Result<bool> {
    hotel.updated_at = Utc::now().naive_utc();
    let count = conn.execute(
        "UPDATE hotels SET name = ?1, city = ?2, address = ?3, contact_number = ?4, description = ?5,
                           status = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            hotel.name,
            hotel.city,
            hotel.address,
            hotel.contact_number,
            hotel.description,
            hotel.status.as_str(),
            fmt_ts(&hotel.updated_at),
            hotel.id,
        ],
    )?;
    Ok(count > 0)
}

/// Removes the hotel together with its bookings and rooms.
pub fn delete_hotel(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    conn.execute("DELETE FROM bookings WHERE hotel_id = ?1", params![id])?;
    let count = conn.execute("DELETE FROM hotels WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_hotel_row(row: &rusqlite::Row) -> anyhow::Result<Hotel> {
    let status_str: String = row.get(6)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    Ok(Hotel {
        id: row.get(0)?,
        name: row.get(1)?,
        city: row.get(2)?,
        address: row.get(3)?,
        contact_number: row.get(4)?,
        description: row.get(5)?,
        status: HotelStatus::parse(&status_str)
            .with_context(|| format!("unknown hotel status: {status_str}"))?,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

pub fn get_hotel(conn: &Connection, id: &str) -> anyhow::Result<Option<Hotel>> {
    let result = conn
        .query_row(
            &format!("SELECT {HOTEL_COLUMNS} FROM hotels h WHERE h.id = ?1"),
            params![id],
            |row| Ok(parse_hotel_row(row)),
        )
        .optional()?;
    result.transpose()
}

pub fn find_hotels(conn: &Connection, filter: &HotelFilter) -> anyhow::Result<Vec<Hotel>> {
    let mut clauses: Vec<String> = vec![];
    let mut values: Vec<Box<dyn ToSql>> = vec![];

    if let Some(search) = non_blank(filter.search.as_deref()) {
        values.push(Box::new(format!("%{search}%")));
        let n = values.len();
        clauses.push(format!(
            "(h.name LIKE ?{n} OR h.description LIKE ?{n} OR h.city LIKE ?{n} OR h.address LIKE ?{n})"
        ));
    }
    if let Some(status) = filter.status {
        values.push(Box::new(status.as_str()));
        clauses.push(format!("h.status = ?{}", values.len()));
    }
    if let Some(city) = non_blank(filter.city.as_deref()) {
        values.push(Box::new(city.to_string()));
        clauses.push(format!("h.city = ?{} COLLATE NOCASE", values.len()));
    }

    let direction = filter.sort.unwrap_or(SortDirection::Asc);
    let sql = format!(
        "SELECT {HOTEL_COLUMNS} FROM hotels h {} ORDER BY h.name {}",
        where_clause(&clauses),
        direction.as_sql()
    );

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn ToSql> = values.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_hotel_row(row)))?;

    let mut hotels = vec![];
    for row in rows {
        hotels.push(row??);
    }
    Ok(hotels)
}

// ── Rooms ──

pub fn insert_room(conn: &Connection, room: &Room) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO rooms (id, hotel_id, room_number, room_type, price, capacity, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            room.id,
            room.hotel_id,
            room.room_number,
            room.room_type,
            room.price,
            room.capacity,
            room.status.as_str(),
            fmt_ts(&room.created_at),
            fmt_ts(&room.updated_at),
        ],
    )?;
    Ok(())
}

fn parse_room_row(row: &rusqlite::Row) -> anyhow::Result<Room> {
    let status_str: String = row.get(6)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    Ok(Room {
        id: row.get(0)?,
        hotel_id: row.get(1)?,
        room_number: row.get(2)?,
        room_type: row.get(3)?,
        price: row.get(4)?,
        capacity: row.get(5)?,
        status: RoomStatus::parse(&status_str)
            .with_context(|| format!("unknown room status: {status_str}"))?,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

pub fn get_room(conn: &Connection, id: &str) -> anyhow::Result<Option<Room>> {
    let result = conn
        .query_row(
            "SELECT id, hotel_id, room_number, room_type, price, capacity, status, created_at, updated_at
             FROM rooms WHERE id = ?1",
            params![id],
            |row| Ok(parse_room_row(row)),
        )
        .optional()?;
    result.transpose()
}

pub fn find_rooms(conn: &Connection, hotel_id: &str, filter: &RoomFilter) -> anyhow::Result<Vec<Room>> {
    let mut clauses = vec!["hotel_id = ?1".to_string()];
    let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(hotel_id.to_string())];

    if let Some(search) = non_blank(filter.search.as_deref()) {
        values.push(Box::new(format!("%{search}%")));
        clauses.push(format!("room_number LIKE ?{}", values.len()));
    }
    if let Some(status) = filter.status {
        values.push(Box::new(status.as_str()));
        clauses.push(format!("status = ?{}", values.len()));
    }
    if let Some(room_type) = non_blank(filter.room_type.as_deref()) {
        values.push(Box::new(room_type.to_string()));
        clauses.push(format!("room_type = ?{} COLLATE NOCASE", values.len()));
    }
    if let Some(min) = filter.min_price {
        values.push(Box::new(min));
        clauses.push(format!("price >= ?{}", values.len()));
    }
    if let Some(max) = filter.max_price {
        values.push(Box::new(max));
        clauses.push(format!("price <= ?{}", values.len()));
    }

    let order_sql = match filter.sort {
        Some(direction) => format!("price {}, room_number ASC", direction.as_sql()),
        None => "room_number ASC".to_string(),
    };
    let sql = format!(
        "SELECT id, hotel_id, room_number, room_type, price, capacity, status, created_at, updated_at
         FROM rooms {} ORDER BY {order_sql}",
        where_clause(&clauses)
    );

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn ToSql> = values.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_room_row(row)))?;

    let mut rooms = vec![];
    for row in rows {
        rooms.push(row??);
    }
    Ok(rooms)
}

/// True when another room of the hotel already uses `room_number`.
pub fn room_number_taken(
    conn: &Connection,
    hotel_id: &str,
    room_number: &str,
    except_room_id: Option<&str>,
) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM rooms WHERE hotel_id = ?1 AND room_number = ?2 AND (?3 IS NULL OR id != ?3)",
        params![hotel_id, room_number, except_room_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Writes every editable room field back and stamps `updated_at`.
pub fn save_room(conn: &Connection, room: &mut Room) -> anyhow::Result<bool> {
    room.updated_at = Utc::now().naive_utc();
    let count = conn.execute(
        "UPDATE rooms SET room_number = ?1, room_type = ?2, price = ?3, capacity = ?4, status = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            room.room_number,
            room.room_type,
            room.price,
            room.capacity,
            room.status.as_str(),
            fmt_ts(&room.updated_at),
            room.id,
        ],
    )?;
    Ok(count > 0)
}

/// Bookings of the room go with it.
pub fn delete_room(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    conn.execute("DELETE FROM bookings WHERE room_id = ?1", params![id])?;
    let count = conn.execute("DELETE FROM rooms WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn update_room_status(conn: &Connection, id: &str, status: RoomStatus) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE rooms SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_ts(&Utc::now().naive_utc()), id],
    )?;
    Ok(count > 0)
}

// ── Bookings ──

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, user_id, hotel_id, room_id, booking_status, payment_status, check_in_date,
                               check_out_date, total_guests, total_amount, transaction_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            booking.id,
            booking.user_id,
            booking.hotel_id,
            booking.room_id,
            booking.booking_status.as_str(),
            booking.payment_status.as_str(),
            fmt_date(booking.check_in_date),
            fmt_date(booking.check_out_date),
            booking.total_guests,
            booking.total_amount,
            booking.transaction_id,
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

/// Writes the mutable parts of a booking back and stamps `updated_at`.
pub fn save_booking(conn: &Connection, booking: &mut Booking) -> anyhow::Result<bool> {
    booking.updated_at = Utc::now().naive_utc();
    let count = conn.execute(
        "UPDATE bookings SET booking_status = ?1, payment_status = ?2, check_in_date = ?3, check_out_date = ?4,
                             total_guests = ?5, total_amount = ?6, transaction_id = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            booking.booking_status.as_str(),
            booking.payment_status.as_str(),
            fmt_date(booking.check_in_date),
            fmt_date(booking.check_out_date),
            booking.total_guests,
            booking.total_amount,
            booking.transaction_id,
            fmt_ts(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;
    result.transpose()
}

pub fn get_bookings_for_room(conn: &Connection, room_id: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.room_id = ?1 ORDER BY b.check_in_date ASC"
    ))?;
    let rows = stmt.query_map(params![room_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// True when a booking that still holds the room overlaps the half-open
/// stay `[check_in, check_out)`.
pub fn has_overlapping_booking(
    conn: &Connection,
    room_id: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE room_id = ?1
           AND booking_status IN ('PENDING', 'CONFIRMED', 'CHECKED_IN', 'CHECKED_OUT')
           AND check_in_date IS NOT NULL AND check_out_date IS NOT NULL
           AND check_in_date < ?3 AND check_out_date > ?2",
        params![
            room_id,
            check_in.format(DATE_FORMAT).to_string(),
            check_out.format(DATE_FORMAT).to_string(),
        ],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn find_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<Vec<Booking>> {
    let mut clauses: Vec<String> = vec![];
    let mut values: Vec<Box<dyn ToSql>> = vec![];

    if let Some(search) = non_blank(filter.search.as_deref()) {
        values.push(Box::new(format!("%{search}%")));
        let n = values.len();
        clauses.push(format!(
            "(b.transaction_id LIKE ?{n} OR u.first_name LIKE ?{n} OR u.last_name LIKE ?{n} \
             OR u.email LIKE ?{n} OR h.name LIKE ?{n} OR r.room_number LIKE ?{n})"
        ));
    }
    if let Some(status) = filter.booking_status {
        values.push(Box::new(status.as_str()));
        clauses.push(format!("b.booking_status = ?{}", values.len()));
    }
    if let Some(status) = filter.payment_status {
        values.push(Box::new(status.as_str()));
        clauses.push(format!("b.payment_status = ?{}", values.len()));
    }
    if let Some(hotel_id) = &filter.hotel_id {
        values.push(Box::new(hotel_id.clone()));
        clauses.push(format!("b.hotel_id = ?{}", values.len()));
    }
    if let Some(user_id) = &filter.user_id {
        values.push(Box::new(user_id.clone()));
        clauses.push(format!("b.user_id = ?{}", values.len()));
    }
    if let Some(start) = filter.check_in_start {
        values.push(Box::new(start.format(DATE_FORMAT).to_string()));
        clauses.push(format!("b.check_in_date >= ?{}", values.len()));
    }
    if let Some(end) = filter.check_in_end {
        values.push(Box::new(end.format(DATE_FORMAT).to_string()));
        clauses.push(format!("b.check_in_date <= ?{}", values.len()));
    }

    let where_sql = where_clause(&clauses);
    let order_sql = match filter.sort {
        Some(direction) => format!("b.check_in_date {}, b.created_at DESC", direction.as_sql()),
        None => "b.created_at DESC".to_string(),
    };
    let limit_sql = match filter.limit {
        Some(limit) => {
            values.push(Box::new(limit));
            format!("LIMIT ?{}", values.len())
        }
        None => String::new(),
    };

    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings b
         JOIN users u ON u.id = b.user_id
         JOIN hotels h ON h.id = b.hotel_id
         JOIN rooms r ON r.id = b.room_id
         {where_sql}
         ORDER BY {order_sql}
         {limit_sql}"
    );

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn ToSql> = values.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking_details(conn: &Connection, id: &str) -> anyhow::Result<Option<BookingDetails>> {
    let result = conn
        .query_row(
            &format!(
                "SELECT {BOOKING_COLUMNS}, u.first_name, u.last_name, u.email, u.contact_number,
                        h.name, h.address, h.contact_number, r.room_number, r.room_type
                 FROM bookings b
                 JOIN users u ON u.id = b.user_id
                 JOIN hotels h ON h.id = b.hotel_id
                 JOIN rooms r ON r.id = b.room_id
                 WHERE b.id = ?1"
            ),
            params![id],
            |row| Ok(parse_details_row(row)),
        )
        .optional()?;
    result.transpose()
}

fn parse_details_row(row: &rusqlite::Row) -> anyhow::Result<BookingDetails> {
    let booking = parse_booking_row(row)?;
    let first_name: String = row.get(13)?;
    let last_name: String = row.get(14)?;
    Ok(BookingDetails {
        booking,
        guest_name: format!("{first_name} {last_name}").trim().to_string(),
        guest_email: row.get(15)?,
        guest_phone: row.get(16)?,
        hotel_name: row.get(17)?,
        hotel_address: row.get(18)?,
        hotel_contact: row.get(19)?,
        room_number: row.get(20)?,
        room_type: row.get(21)?,
    })
}

pub fn get_user_transactions(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS}, h.name, r.room_type, r.room_number
         FROM bookings b
         JOIN hotels h ON h.id = b.hotel_id
         JOIN rooms r ON r.id = b.room_id
         WHERE b.user_id = ?1
         ORDER BY b.check_in_date DESC, b.created_at DESC"
    ))?;

    let rows = stmt.query_map(params![user_id], |row| {
        Ok(parse_booking_row(row).and_then(|b| {
            Ok(Transaction {
                id: b.id,
                transaction_id: b.transaction_id,
                amount: b.total_amount,
                payment_status: b.payment_status,
                booking_status: b.booking_status,
                date: b.created_at,
                check_in_date: b.check_in_date,
                check_out_date: b.check_out_date,
                total_guests: b.total_guests,
                hotel_name: row.get(13)?,
                room_type: row.get(14)?,
                room_number: row.get(15)?,
            })
        }))
    })?;

    let mut transactions = vec![];
    for row in rows {
        transactions.push(row??);
    }
    Ok(transactions)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let booking_status_str: String = row.get(4)?;
    let payment_status_str: String = row.get(5)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        hotel_id: row.get(2)?,
        room_id: row.get(3)?,
        booking_status: BookingStatus::parse(&booking_status_str)
            .with_context(|| format!("unknown booking status: {booking_status_str}"))?,
        payment_status: PaymentStatus::parse(&payment_status_str)
            .with_context(|| format!("unknown payment status: {payment_status_str}"))?,
        check_in_date: parse_date(row.get(6)?),
        check_out_date: parse_date(row.get(7)?),
        total_guests: row.get(8)?,
        total_amount: row.get(9)?,
        transaction_id: row.get(10)?,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}
