//! # Domain Types
//!
//! Core domain types used throughout the pickup backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Point       │   │    Reception    │   │    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  point_id (FK)  │◄──│  reception_id   │       │
//! │  │  registered_at  │   │  started_at     │   │  received_at    │       │
//! │  │  city           │   │  status         │   │  product_type   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      City       │   │ ReceptionStatus │   │  ProductType    │       │
//! │  │  Moscow         │   │  InProgress     │   │  Electronics    │       │
//! │  │  Kazan          │   │  Closed         │   │  Clothes        │       │
//! │  │  SaintPetersburg│   └─────────────────┘   │  Shoes          │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stored Names
//! Cities and product types keep their Russian names on the wire and in the
//! database. `as_str`, `Display`, `FromStr` and serde all agree on them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

// =============================================================================
// City
// =============================================================================

/// A city where pickup points may be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "city"))]
pub enum City {
    #[serde(rename = "Москва")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Москва"))]
    Moscow,
    #[serde(rename = "Казань")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Казань"))]
    Kazan,
    #[serde(rename = "Санкт-Петербург")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Санкт-Петербург"))]
    SaintPetersburg,
}

impl City {
    /// Every supported city.
    pub const ALL: [City; 3] = [City::Moscow, City::Kazan, City::SaintPetersburg];

    /// Returns the stored name of the city.
    pub const fn as_str(&self) -> &'static str {
        match self {
            City::Moscow => "Москва",
            City::Kazan => "Казань",
            City::SaintPetersburg => "Санкт-Петербург",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for City {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        City::ALL
            .into_iter()
            .find(|city| city.as_str() == s)
            .ok_or_else(|| CoreError::InvalidCity(s.to_string()))
    }
}

// =============================================================================
// Product Type
// =============================================================================

/// The kind of item accepted during a reception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "product_type"))]
pub enum ProductType {
    #[serde(rename = "электроника")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "электроника"))]
    Electronics,
    #[serde(rename = "одежда")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "одежда"))]
    Clothes,
    #[serde(rename = "обувь")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "обувь"))]
    Shoes,
}

impl ProductType {
    /// Every supported product type.
    pub const ALL: [ProductType; 3] = [
        ProductType::Electronics,
        ProductType::Clothes,
        ProductType::Shoes,
    ];

    /// Returns the stored name of the product type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductType::Electronics => "электроника",
            ProductType::Clothes => "одежда",
            ProductType::Shoes => "обувь",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::InvalidProductType(s.to_string()))
    }
}

// =============================================================================
// Reception Status
// =============================================================================

/// The status of a reception.
///
/// ## Lifecycle
/// ```text
/// {absent} ──StartReception──► InProgress ──CloseActiveReception──► Closed
///                                                                  (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "reception_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ReceptionStatus {
    /// Products may be appended and removed.
    InProgress,
    /// Finished; never reopened.
    Closed,
}

impl ReceptionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReceptionStatus::InProgress => "in_progress",
            ReceptionStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for ReceptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Point
// =============================================================================

/// A pickup point. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Point {
    /// Unique identifier (UUID v4).
    pub id: Uuid,

    /// When the point was opened.
    pub registered_at: DateTime<Utc>,

    /// City the point is located in.
    pub city: City,
}

// =============================================================================
// Reception
// =============================================================================

/// One intake session at a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Reception {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub point_id: Uuid,
    pub status: ReceptionStatus,
}

impl Reception {
    /// Checks if products can still be appended or removed.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ReceptionStatus::InProgress
    }
}

// =============================================================================
// Product
// =============================================================================

/// An item accepted during a reception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Uuid,
    /// Creation time; the latest one is removed first.
    pub received_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub reception_id: Uuid,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_round_trips_through_name() {
        for city in City::ALL {
            assert_eq!(city.as_str().parse::<City>().unwrap(), city);
        }
    }

    #[test]
    fn test_unknown_city_is_rejected() {
        let err = "Новосибирск".parse::<City>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidCity(ref name) if name == "Новосибирск"));
    }

    #[test]
    fn test_unknown_product_type_is_rejected() {
        let err = "мебель".parse::<ProductType>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidProductType(_)));
        assert_eq!("обувь".parse::<ProductType>().unwrap(), ProductType::Shoes);
    }

    #[test]
    fn test_serde_uses_stored_names() {
        let json = serde_json::to_string(&City::SaintPetersburg).unwrap();
        assert_eq!(json, "\"Санкт-Петербург\"");

        let status: ReceptionStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, ReceptionStatus::InProgress);
    }

    #[test]
    fn test_product_serializes_type_field() {
        let product = Product {
            id: Uuid::nil(),
            received_at: Utc::now(),
            product_type: ProductType::Electronics,
            reception_id: Uuid::nil(),
        };
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["type"], "электроника");
    }

    #[test]
    fn test_reception_is_active() {
        let mut reception = Reception {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            point_id: Uuid::new_v4(),
            status: ReceptionStatus::InProgress,
        };
        assert!(reception.is_active());

        reception.status = ReceptionStatus::Closed;
        assert!(!reception.is_active());
    }
}
