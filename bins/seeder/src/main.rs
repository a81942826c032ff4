//! Database seeder for FuelFlow development and testing.
//!
//! Seeds one user per role, a small vehicle type catalog, and a couple of
//! vehicles so the approval chain can be exercised end to end right after
//! a fresh migration.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::str::FromStr;
use uuid::Uuid;

use fuelflow_core::auth::hash_password;
use fuelflow_core::workflow::Role;
use fuelflow_db::entities::{sea_orm_active_enums::UserRole, users, vehicle_types, vehicles};

/// Development password shared by all seeded accounts.
const DEV_PASSWORD: &str = "fuelflow-dev";

/// Fixed IDs so seeds are idempotent and easy to reference from scripts.
const VEHICLE_TYPE_TRUCK: &str = "00000000-0000-0000-0000-00000000a001";
const VEHICLE_TYPE_VAN: &str = "00000000-0000-0000-0000-00000000a002";
const VEHICLE_TRUCK: &str = "00000000-0000-0000-0000-00000000b001";
const VEHICLE_VAN: &str = "00000000-0000-0000-0000-00000000b002";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = fuelflow_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding users...");
    seed_users(&db).await;

    println!("Seeding vehicle types...");
    seed_vehicle_types(&db).await;

    println!("Seeding vehicles...");
    seed_vehicles(&db).await;

    println!("Seeding complete!");
    println!("All accounts use the password: {DEV_PASSWORD}");
}

fn fixed_id(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap()
}

/// Seeds one account per role.
async fn seed_users(db: &DatabaseConnection) {
    let accounts = [
        ("00000000-0000-0000-0000-000000000001", "admin@fuelflow.dev", "Dev Admin", Role::Admin),
        ("00000000-0000-0000-0000-000000000002", "driver@fuelflow.dev", "Dev Driver", Role::Driver),
        (
            "00000000-0000-0000-0000-000000000003",
            "supervisor@fuelflow.dev",
            "Dev Supervisor",
            Role::Supervisor,
        ),
        ("00000000-0000-0000-0000-000000000004", "fueler@fuelflow.dev", "Dev Fueler", Role::Fueler),
        (
            "00000000-0000-0000-0000-000000000005",
            "director@fuelflow.dev",
            "Dev Director",
            Role::Director,
        ),
    ];

    let password_hash = hash_password(DEV_PASSWORD).expect("Failed to hash dev password");

    for (id, email, name, role) in accounts {
        let id = fixed_id(id);
        if users::Entity::find_by_id(id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            println!("  {email} already exists, skipping...");
            continue;
        }

        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(id),
            email: Set(email.to_string()),
            display_name: Set(name.to_string()),
            role: Set(UserRole::from(role)),
            password_hash: Set(password_hash.clone()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        user.insert(db).await.expect("Failed to seed user");
        println!("  Created {email} ({})", role.as_str());
    }
}

/// Seeds a small vehicle type catalog.
async fn seed_vehicle_types(db: &DatabaseConnection) {
    let types = [
        (VEHICLE_TYPE_TRUCK, "Box truck", Some("Canter-class delivery truck"), "28.5"),
        (VEHICLE_TYPE_VAN, "Panel van", None, "12.0"),
    ];

    for (id, name, description, threshold) in types {
        let id = fixed_id(id);
        if vehicle_types::Entity::find_by_id(id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            println!("  {name} already exists, skipping...");
            continue;
        }

        let now = Utc::now().into();
        let vehicle_type = vehicle_types::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            description: Set(description.map(String::from)),
            consumption_threshold: Set(Some(Decimal::from_str(threshold).unwrap())),
            created_at: Set(now),
            updated_at: Set(now),
        };
        vehicle_type
            .insert(db)
            .await
            .expect("Failed to seed vehicle type");
        println!("  Created vehicle type {name}");
    }
}

/// Seeds one vehicle of each type.
async fn seed_vehicles(db: &DatabaseConnection) {
    let fleet = [
        (VEHICLE_TRUCK, "B-9001-XY", VEHICLE_TYPE_TRUCK, Some("Canter"), Some(2022)),
        (VEHICLE_VAN, "B-4417-ZK", VEHICLE_TYPE_VAN, Some("Traviata"), Some(2020)),
    ];

    for (id, plate, type_id, model, year) in fleet {
        let id = fixed_id(id);
        if vehicles::Entity::find_by_id(id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            println!("  {plate} already exists, skipping...");
            continue;
        }

        let now = Utc::now().into();
        let vehicle = vehicles::ActiveModel {
            id: Set(id),
            plate_number: Set(plate.to_string()),
            vehicle_type_id: Set(fixed_id(type_id)),
            model: Set(model.map(String::from)),
            year: Set(year),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        vehicle.insert(db).await.expect("Failed to seed vehicle");
        println!("  Created vehicle {plate}");
    }
}
