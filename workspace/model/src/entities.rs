//! This file serves as the root for all SeaORM entity modules.
//! The data models for the fleet management application live here:
//! manufacturers, cars, drivers, and the car/driver assignment table.

pub mod car;
pub mod car_driver;
pub mod driver;
pub mod manufacturer;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::car::Entity as Car;
    pub use super::car_driver::Entity as CarDriver;
    pub use super::driver::Entity as Driver;
    pub use super::manufacturer::Entity as Manufacturer;
}

#[cfg(test)]
mod test {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    async fn insert_driver(
        db: &DatabaseConnection,
        username: &str,
        first_name: &str,
        last_name: &str,
        license_number: &str,
    ) -> Result<driver::Model, DbErr> {
        driver::ActiveModel {
            username: Set(username.to_string()),
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            password_hash: Set("$argon2id$test-only".to_string()),
            license_number: Set(license_number.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        // Create manufacturers
        let toyota = manufacturer::ActiveModel {
            name: Set("Toyota".to_string()),
            country: Set("Japan".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let ford = manufacturer::ActiveModel {
            name: Set("Ford".to_string()),
            country: Set("USA".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Create cars
        let corolla = car::ActiveModel {
            model: Set("Corolla".to_string()),
            manufacturer_id: Set(toyota.id),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let focus = car::ActiveModel {
            model: Set("Focus".to_string()),
            manufacturer_id: Set(ford.id),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Create drivers
        let driver1 = insert_driver(&db, "driver1", "Ada", "Lovelace", "ABC04308").await?;
        let driver2 = insert_driver(&db, "driver2", "Alan", "Turing", "XYZ12345").await?;

        // Assign both drivers to the Corolla, one to the Focus
        car_driver::ActiveModel {
            car_id: Set(corolla.id),
            driver_id: Set(driver1.id),
        }
        .insert(&db)
        .await?;

        car_driver::ActiveModel {
            car_id: Set(corolla.id),
            driver_id: Set(driver2.id),
        }
        .insert(&db)
        .await?;

        car_driver::ActiveModel {
            car_id: Set(focus.id),
            driver_id: Set(driver2.id),
        }
        .insert(&db)
        .await?;

        // Read back and verify data
        let manufacturers = Manufacturer::find().all(&db).await?;
        assert_eq!(manufacturers.len(), 2);
        assert!(manufacturers.iter().any(|m| m.name == "Toyota"));
        assert!(manufacturers.iter().any(|m| m.name == "Ford"));

        let cars = Car::find().all(&db).await?;
        assert_eq!(cars.len(), 2);

        let drivers = Driver::find().all(&db).await?;
        assert_eq!(drivers.len(), 2);

        // Display forms
        assert_eq!(toyota.to_string(), "Toyota Japan");
        assert_eq!(corolla.to_string(), "Corolla");
        assert_eq!(driver1.to_string(), "driver1 (Ada Lovelace)");

        // The many-to-many relation is readable from both sides
        let corolla_drivers = corolla.find_related(Driver).all(&db).await?;
        assert_eq!(corolla_drivers.len(), 2);

        let driver2_cars = driver2.find_related(Car).all(&db).await?;
        assert_eq!(driver2_cars.len(), 2);

        let driver1_cars = driver1.find_related(Car).all(&db).await?;
        assert_eq!(driver1_cars.len(), 1);
        assert_eq!(driver1_cars[0].id, corolla.id);

        // Unique license numbers
        let duplicate = insert_driver(&db, "driver3", "Grace", "Hopper", "ABC04308").await;
        assert!(duplicate.is_err());

        // Deleting a manufacturer cascades to its cars and their assignments
        ford.delete(&db).await?;
        let cars_after = Car::find().all(&db).await?;
        assert_eq!(cars_after.len(), 1);
        assert_eq!(cars_after[0].id, corolla.id);

        let focus_links = CarDriver::find()
            .filter(car_driver::Column::CarId.eq(focus.id))
            .all(&db)
            .await?;
        assert!(focus_links.is_empty());

        // Deleting a driver cascades to its assignments but not the cars
        driver2.delete(&db).await?;
        let links = CarDriver::find().all(&db).await?;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].driver_id, driver1.id);
        assert_eq!(Car::find().all(&db).await?.len(), 1);

        Ok(())
    }
}
