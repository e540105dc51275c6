use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Hotel, HotelFilter, HotelStatus, Room, RoomFilter, RoomStatus, User};
use crate::services::bookings;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct NewHotel {
    pub name: String,
    pub city: Option<String>,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub status: HotelStatus,
}

/// Partial hotel edit; absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateHotel {
    pub name: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    pub description: Option<String>,
    pub status: Option<HotelStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoom {
    pub room_number: String,
    pub room_type: String,
    pub price: f64,
    pub capacity: Option<i32>,
}

/// Partial room edit; absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRoom {
    pub room_number: Option<String>,
    pub room_type: Option<String>,
    pub price: Option<f64>,
    pub capacity: Option<i32>,
    pub status: Option<RoomStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Option<String>,
    pub contact_number: Option<String>,
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn check_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::BadRequest("price must be non-negative".to_string()));
    }
    Ok(())
}

fn hotel_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Hotel not found with id: {id}"))
}

fn room_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Room not found with id: {id}"))
}

// ── Hotels ──

pub fn create_hotel(state: &AppState, req: NewHotel) -> Result<Hotel, AppError> {
    let now = Utc::now().naive_utc();
    let hotel = Hotel {
        id: Uuid::new_v4().to_string(),
        name: required(&req.name, "name")?,
        city: req.city,
        address: req.address,
        contact_number: req.contact_number,
        description: req.description,
        status: req.status,
        created_at: now,
        updated_at: now,
    };

    let db = state.lock_db()?;
    queries::insert_hotel(&db, &hotel)?;
    tracing::info!(hotel_id = %hotel.id, name = %hotel.name, "hotel created");
    Ok(hotel)
}

pub fn get_hotel(state: &AppState, id: &str) -> Result<Hotel, AppError> {
    let db = state.lock_db()?;
    queries::get_hotel(&db, id)?.ok_or_else(|| hotel_not_found(id))
}

pub fn list_hotels(state: &AppState, filter: &HotelFilter) -> Result<Vec<Hotel>, AppError> {
    let db = state.lock_db()?;
    Ok(queries::find_hotels(&db, filter)?)
}

pub fn update_hotel(state: &AppState, id: &str, req: UpdateHotel) -> Result<Hotel, AppError> {
    let db = state.lock_db()?;
    let mut hotel = queries::get_hotel(&db, id)?.ok_or_else(|| hotel_not_found(id))?;

    if let Some(name) = req.name {
        hotel.name = required(&name, "name")?;
    }
    if req.city.is_some() {
        hotel.city = req.city;
    }
    if req.address.is_some() {
        hotel.address = req.address;
    }
    if req.contact_number.is_some() {
        hotel.contact_number = req.contact_number;
    }
    if req.description.is_some() {
        hotel.description = req.description;
    }
    if let Some(status) = req.status {
        hotel.status = status;
    }

    queries::save_hotel(&db, &mut hotel)?;
    tracing::info!(hotel_id = %id, "hotel updated");
    Ok(hotel)
}

/// Removes the hotel, its rooms and every booking made there.
pub fn delete_hotel(state: &AppState, id: &str) -> Result<(), AppError> {
    let mut db = state.lock_db()?;
    let tx = db.transaction()?;
    if !queries::delete_hotel(&tx, id)? {
        return Err(hotel_not_found(id));
    }
    tx.commit()?;

    tracing::info!(hotel_id = %id, "hotel deleted");
    Ok(())
}

pub fn hotel_guests(state: &AppState, hotel_id: &str) -> Result<Vec<User>, AppError> {
    let db = state.lock_db()?;
    if queries::get_hotel(&db, hotel_id)?.is_none() {
        return Err(hotel_not_found(hotel_id));
    }
    Ok(queries::list_hotel_guests(&db, hotel_id)?)
}

// ── Rooms ──

pub fn create_room(state: &AppState, hotel_id: &str, req: NewRoom) -> Result<Room, AppError> {
    check_price(req.price)?;
    let room_number = required(&req.room_number, "room_number")?;
    let room_type = required(&req.room_type, "room_type")?;

    let db = state.lock_db()?;
    if queries::get_hotel(&db, hotel_id)?.is_none() {
        return Err(hotel_not_found(hotel_id));
    }
    if queries::room_number_taken(&db, hotel_id, &room_number, None)? {
        return Err(AppError::Conflict(format!(
            "Room {room_number} already exists in this hotel"
        )));
    }

    let now = Utc::now().naive_utc();
    let room = Room {
        id: Uuid::new_v4().to_string(),
        hotel_id: hotel_id.to_string(),
        room_number,
        room_type,
        price: req.price,
        capacity: req.capacity,
        status: RoomStatus::Available,
        created_at: now,
        updated_at: now,
    };
    queries::insert_room(&db, &room)?;

    tracing::info!(room_id = %room.id, hotel_id = %hotel_id, "room created");
    Ok(room)
}

pub fn get_room(state: &AppState, id: &str) -> Result<Room, AppError> {
    let db = state.lock_db()?;
    queries::get_room(&db, id)?.ok_or_else(|| room_not_found(id))
}

pub fn list_rooms(state: &AppState, hotel_id: &str, filter: &RoomFilter) -> Result<Vec<Room>, AppError> {
    let db = state.lock_db()?;
    if queries::get_hotel(&db, hotel_id)?.is_none() {
        return Err(hotel_not_found(hotel_id));
    }
    Ok(queries::find_rooms(&db, hotel_id, filter)?)
}

/// Partial edit. A new status goes through the same derivation as
/// `set_room_status`.
pub fn update_room(state: &AppState, id: &str, req: UpdateRoom) -> Result<Room, AppError> {
    if let Some(price) = req.price {
        check_price(price)?;
    }

    let mut db = state.lock_db()?;
    let tx = db.transaction()?;
    let mut room = queries::get_room(&tx, id)?.ok_or_else(|| room_not_found(id))?;

    if let Some(number) = req.room_number {
        let number = required(&number, "room_number")?;
        if queries::room_number_taken(&tx, &room.hotel_id, &number, Some(id))? {
            return Err(AppError::Conflict(format!(
                "Room {number} already exists in this hotel"
            )));
        }
        room.room_number = number;
    }
    if let Some(room_type) = req.room_type {
        room.room_type = required(&room_type, "room_type")?;
    }
    if let Some(price) = req.price {
        room.price = price;
    }
    if req.capacity.is_some() {
        room.capacity = req.capacity;
    }
    if let Some(status) = req.status {
        room.status = status;
    }

    queries::save_room(&tx, &mut room)?;
    if let Some(status) = bookings::reconcile_room(&tx, id)? {
        room.status = status;
    }
    tx.commit()?;

    tracing::info!(room_id = %id, status = room.status.as_str(), "room updated");
    Ok(room)
}

/// Staff status edit. MAINTENANCE is stored as given; any other status is
/// re-derived from the room's bookings, so a room that still has guests
/// stays BOOKED.
pub fn set_room_status(state: &AppState, room_id: &str, status: RoomStatus) -> Result<Room, AppError> {
    let mut db = state.lock_db()?;
    let tx = db.transaction()?;
    if !queries::update_room_status(&tx, room_id, status)? {
        return Err(room_not_found(room_id));
    }
    bookings::reconcile_room(&tx, room_id)?;
    let room = queries::get_room(&tx, room_id)?.ok_or_else(|| room_not_found(room_id))?;
    tx.commit()?;

    tracing::info!(
        room_id = %room_id,
        requested = status.as_str(),
        applied = room.status.as_str(),
        "room status set by staff"
    );
    Ok(room)
}

/// Bookings of the room are deleted with it.
pub fn delete_room(state: &AppState, id: &str) -> Result<(), AppError> {
    let mut db = state.lock_db()?;
    let tx = db.transaction()?;
    if !queries::delete_room(&tx, id)? {
        return Err(room_not_found(id));
    }
    tx.commit()?;

    tracing::info!(room_id = %id, "room deleted");
    Ok(())
}

// ── Guests ──

pub fn register_user(state: &AppState, req: NewUser) -> Result<User, AppError> {
    let email = req.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
    if let Some(email) = &email {
        if !email.contains('@') {
            return Err(AppError::BadRequest(format!("invalid email: {email}")));
        }
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        first_name: required(&req.first_name, "first_name")?,
        last_name: req.last_name.trim().to_string(),
        email,
        contact_number: req.contact_number,
        created_at: Utc::now().naive_utc(),
    };

    let db = state.lock_db()?;
    queries::insert_user(&db, &user)?;
    tracing::info!(user_id = %user.id, "user registered");
    Ok(user)
}

pub fn get_user(state: &AppState, id: &str) -> Result<User, AppError> {
    let db = state.lock_db()?;
    queries::get_user(&db, id)?.ok_or_else(|| AppError::NotFound(format!("User not found with id: {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::config::AppConfig;
    use crate::db;
    use crate::models::{Booking, BookingStatus, PaymentStatus};
    use crate::services::notifications::console::ConsoleNotifier;

    fn test_state() -> AppState {
        AppState {
            db: Arc::new(Mutex::new(db::init_db(":memory:").unwrap())),
            config: AppConfig {
                port: 0,
                database_url: ":memory:".to_string(),
                admin_token: "t".to_string(),
                cancellation_hours_before_checkin: 1,
                whatsapp_server_url: String::new(),
                whatsapp_country_code: "91".to_string(),
                smtp_host: String::new(),
                smtp_port: 587,
                smtp_username: String::new(),
                smtp_password: String::new(),
                mail_from: String::new(),
                app_name: "StayWell".to_string(),
            },
            email: Box::new(ConsoleNotifier),
            messaging: Box::new(ConsoleNotifier),
        }
    }

    fn new_hotel(name: &str) -> NewHotel {
        NewHotel {
            name: name.to_string(),
            city: Some("Pune".to_string()),
            address: None,
            contact_number: None,
            description: None,
            status: HotelStatus::Active,
        }
    }

    fn new_room(number: &str, price: f64) -> NewRoom {
        NewRoom {
            room_number: number.to_string(),
            room_type: "Deluxe".to_string(),
            price,
            capacity: Some(2),
        }
    }

    fn add_booking(state: &AppState, room: &Room, user: &User, status: BookingStatus) {
        let now = Utc::now().naive_utc();
        let db = state.lock_db().unwrap();
        queries::insert_booking(
            &db,
            &Booking {
                id: Uuid::new_v4().to_string(),
                user_id: user.id.clone(),
                hotel_id: room.hotel_id.clone(),
                room_id: room.id.clone(),
                booking_status: status,
                payment_status: PaymentStatus::Pending,
                check_in_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 10),
                check_out_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 11),
                total_guests: 1,
                total_amount: room.price,
                transaction_id: None,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
        bookings::reconcile_room(&db, &room.id).unwrap();
    }

    fn guest(state: &AppState, first_name: &str) -> User {
        register_user(
            state,
            NewUser {
                first_name: first_name.to_string(),
                last_name: String::new(),
                email: None,
                contact_number: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_set_room_status_rederives_unless_maintenance() {
        let state = test_state();
        let hotel = create_hotel(&state, new_hotel("Lakeview Inn")).unwrap();
        let room = create_room(&state, &hotel.id, new_room("101", 1000.0)).unwrap();
        let user = guest(&state, "Asha");
        add_booking(&state, &room, &user, BookingStatus::Pending);

        let room = set_room_status(&state, &room.id, RoomStatus::Maintenance).unwrap();
        assert_eq!(room.status, RoomStatus::Maintenance);

        let room = set_room_status(&state, &room.id, RoomStatus::Available).unwrap();
        assert_eq!(room.status, RoomStatus::Booked);
    }

    #[test]
    fn test_set_booked_on_empty_room_is_available() {
        let state = test_state();
        let hotel = create_hotel(&state, new_hotel("Lakeview Inn")).unwrap();
        let room = create_room(&state, &hotel.id, new_room("101", 1000.0)).unwrap();

        let room = set_room_status(&state, &room.id, RoomStatus::Booked).unwrap();
        assert_eq!(room.status, RoomStatus::Available);
        assert!(matches!(
            set_room_status(&state, "missing", RoomStatus::Available),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_room_partial() {
        let state = test_state();
        let hotel = create_hotel(&state, new_hotel("Lakeview Inn")).unwrap();
        let room = create_room(&state, &hotel.id, new_room("101", 1000.0)).unwrap();
        create_room(&state, &hotel.id, new_room("102", 1500.0)).unwrap();

        let updated = update_room(
            &state,
            &room.id,
            UpdateRoom {
                price: Some(1200.0),
                room_type: Some("Suite".to_string()),
                ..UpdateRoom::default()
            },
        )
        .unwrap();
        assert_eq!(updated.price, 1200.0);
        assert_eq!(updated.room_type, "Suite");
        assert_eq!(updated.room_number, "101");
        assert_eq!(updated.capacity, Some(2));

        let clash = update_room(
            &state,
            &room.id,
            UpdateRoom {
                room_number: Some("102".to_string()),
                ..UpdateRoom::default()
            },
        );
        assert!(matches!(clash, Err(AppError::Conflict(_))));

        // Keeping its own number is not a clash
        let same = update_room(
            &state,
            &room.id,
            UpdateRoom {
                room_number: Some("101".to_string()),
                ..UpdateRoom::default()
            },
        );
        assert!(same.is_ok());

        let negative = update_room(
            &state,
            &room.id,
            UpdateRoom {
                price: Some(-1.0),
                ..UpdateRoom::default()
            },
        );
        assert!(matches!(negative, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_delete_room_takes_bookings() {
        let state = test_state();
        let hotel = create_hotel(&state, new_hotel("Lakeview Inn")).unwrap();
        let room = create_room(&state, &hotel.id, new_room("101", 1000.0)).unwrap();
        let user = guest(&state, "Asha");
        add_booking(&state, &room, &user, BookingStatus::Confirmed);

        delete_room(&state, &room.id).unwrap();
        assert!(matches!(get_room(&state, &room.id), Err(AppError::NotFound(_))));

        let db = state.lock_db().unwrap();
        assert!(queries::get_bookings_for_room(&db, &room.id).unwrap().is_empty());
        drop(db);

        assert!(matches!(delete_room(&state, &room.id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_update_and_delete_hotel() {
        let state = test_state();
        let hotel = create_hotel(&state, new_hotel("Lakeview Inn")).unwrap();
        let room = create_room(&state, &hotel.id, new_room("101", 1000.0)).unwrap();
        let user = guest(&state, "Asha");
        add_booking(&state, &room, &user, BookingStatus::Pending);

        let updated = update_hotel(
            &state,
            &hotel.id,
            UpdateHotel {
                description: Some("By the lake".to_string()),
                status: Some(HotelStatus::Inactive),
                ..UpdateHotel::default()
            },
        )
        .unwrap();
        assert_eq!(updated.name, "Lakeview Inn");
        assert_eq!(updated.city.as_deref(), Some("Pune"));
        assert_eq!(updated.status, HotelStatus::Inactive);

        delete_hotel(&state, &hotel.id).unwrap();
        assert!(matches!(get_hotel(&state, &hotel.id), Err(AppError::NotFound(_))));
        assert!(matches!(get_room(&state, &room.id), Err(AppError::NotFound(_))));
        assert!(get_user(&state, &user.id).is_ok());
    }

    #[test]
    fn test_hotel_guests_are_distinct() {
        let state = test_state();
        let hotel = create_hotel(&state, new_hotel("Lakeview Inn")).unwrap();
        let other = create_hotel(&state, new_hotel("Harbor Suites")).unwrap();
        let room = create_room(&state, &hotel.id, new_room("101", 1000.0)).unwrap();
        let other_room = create_room(&state, &other.id, new_room("1", 500.0)).unwrap();
        let asha = guest(&state, "Asha");
        let ravi = guest(&state, "Ravi");

        add_booking(&state, &room, &asha, BookingStatus::Completed);
        add_booking(&state, &room, &asha, BookingStatus::Cancelled);
        add_booking(&state, &other_room, &ravi, BookingStatus::Pending);

        let guests = hotel_guests(&state, &hotel.id).unwrap();
        assert_eq!(guests.len(), 1);
        assert_eq!(guests[0].id, asha.id);
        assert!(matches!(hotel_guests(&state, "missing"), Err(AppError::NotFound(_))));
    }
}
