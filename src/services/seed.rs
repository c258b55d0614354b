use crate::{
    entities::{
        product::{self, ProductCategory, ProductCondition},
        review, Product, Review,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog::{average_rating, generate_slug},
};
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const DEFAULT_BRAND: &str = "Imperial";

/// Identifier/name/slug triple reported after a reseed
#[derive(Debug, Serialize, ToSchema)]
pub struct SeededProduct {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Destructive catalog reseeding. Wipes products (and their reviews) and
/// repopulates from the fixture list; purchases, orders, chat, and demo
/// requests are left alone so history survives a reseed.
#[derive(Clone)]
pub struct SeedService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl SeedService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn reseed(&self) -> Result<Vec<SeededProduct>, ServiceError> {
        warn!("Reseeding catalog: wiping all products and reviews");
        Review::delete_many().exec(&*self.db).await?;
        Product::delete_many().exec(&*self.db).await?;

        let (products, reviews, seeded) = build_seed_rows(Utc::now());

        Product::insert_many(products).exec(&*self.db).await?;
        if !reviews.is_empty() {
            Review::insert_many(reviews).exec(&*self.db).await?;
        }

        self.event_sender
            .send_or_log(Event::CatalogSeeded {
                count: seeded.len(),
            })
            .await;

        info!("Seeded {} products", seeded.len());
        Ok(seeded)
    }
}

type SeedRows = (
    Vec<product::ActiveModel>,
    Vec<review::ActiveModel>,
    Vec<SeededProduct>,
);

/// Expands the fixture list into insertable rows: synthesized review sets
/// for featured items, randomized stock, derived ratings and slugs.
fn build_seed_rows(now: chrono::DateTime<Utc>) -> SeedRows {
    let mut rng = rand::thread_rng();
    let mut products = Vec::new();
    let mut reviews = Vec::new();
    let mut seeded = Vec::new();

    for fixture in fixtures() {
        let product_id = Uuid::new_v4();
        let slug = generate_slug(fixture.name);

        let review_count = if fixture.featured {
            rng.gen_range(3..8)
        } else {
            rng.gen_range(0..3)
        };
        let mut ratings = Vec::with_capacity(review_count);
        for _ in 0..review_count {
            let rating = rng.gen_range(4..=5);
            ratings.push(rating);
            reviews.push(review::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product_id),
                user_name: Set(REVIEWER_NAMES[rng.gen_range(0..REVIEWER_NAMES.len())].to_string()),
                rating: Set(rating),
                comment: Set(REVIEW_COMMENTS[rng.gen_range(0..REVIEW_COMMENTS.len())].to_string()),
                created_at: Set(now),
            });
        }

        let stock_quantity = rng.gen_range(10..110);
        let long_description = format!(
            "{} Experience premium quality and modern design with this exceptional product.",
            fixture.description
        );
        let tags = format!("{:?},premium,modern", fixture.category).to_lowercase();

        products.push(product::ActiveModel {
            id: Set(product_id),
            name: Set(fixture.name.to_string()),
            slug: Set(slug.clone()),
            description: Set(fixture.description.to_string()),
            long_description: Set(long_description),
            price: Set(Decimal::from(fixture.price)),
            original_price: Set(fixture.original_price.map(Decimal::from)),
            image: Set(fixture.image.to_string()),
            images: Set(serde_json::json!([fixture.image])),
            category: Set(fixture.category),
            brand: Set(DEFAULT_BRAND.to_string()),
            featured: Set(fixture.featured),
            in_stock: Set(stock_quantity > 0),
            stock_quantity: Set(stock_quantity),
            condition: Set(ProductCondition::New),
            seller_id: Set(None),
            seller_name: Set(String::new()),
            seller_contact: Set(String::new()),
            is_user_product: Set(false),
            rating: Set(average_rating(ratings.iter().copied())),
            specifications: Set(serde_json::json!({})),
            tags: Set(tags),
            created_at: Set(now),
        });

        seeded.push(SeededProduct {
            id: product_id,
            name: fixture.name.to_string(),
            slug,
        });
    }

    (products, reviews, seeded)
}

struct ProductFixture {
    name: &'static str,
    description: &'static str,
    price: i64,
    original_price: Option<i64>,
    image: &'static str,
    category: ProductCategory,
    featured: bool,
}

const REVIEWER_NAMES: &[&str] = &[
    "John Doe",
    "Jane Smith",
    "Mike Johnson",
    "Sarah Williams",
    "David Brown",
    "Emily Davis",
    "Chris Wilson",
    "Lisa Anderson",
];

const REVIEW_COMMENTS: &[&str] = &[
    "Excellent product! Highly recommend.",
    "Great quality and fast shipping.",
    "Love it! Exceeded my expectations.",
    "Perfect for my needs. Very satisfied.",
    "Amazing value for money.",
    "Top quality product. Will buy again!",
    "Outstanding quality and design.",
    "Very happy with this purchase.",
];

fn fixtures() -> Vec<ProductFixture> {
    use ProductCategory::*;

    vec![
        ProductFixture {
            name: "Premium Smartphone Pro",
            description: "Latest flagship smartphone with advanced camera system and 5G connectivity",
            price: 74999,
            original_price: Some(79999),
            image: "https://images.unsplash.com/photo-1511707171634-5f897ff02aa9?w=400",
            category: Electronics,
            featured: true,
        },
        ProductFixture {
            name: "Wireless Noise-Cancelling Headphones",
            description: "Premium over-ear headphones with active noise cancellation and 30-hour battery",
            price: 28999,
            original_price: None,
            image: "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=400",
            category: Electronics,
            featured: true,
        },
        ProductFixture {
            name: "Ultra-Slim Laptop",
            description: "High-performance laptop with 16GB RAM, 1TB SSD, and stunning 4K display",
            price: 107999,
            original_price: Some(119999),
            image: "https://images.unsplash.com/photo-1496181133206-80ce9b88a853?w=400",
            category: Electronics,
            featured: true,
        },
        ProductFixture {
            name: "Smart Watch Series X",
            description: "Advanced fitness tracking, heart rate monitor, and smartphone notifications",
            price: 24999,
            original_price: None,
            image: "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=400",
            category: Electronics,
            featured: true,
        },
        ProductFixture {
            name: "Wireless Earbuds Pro",
            description: "True wireless earbuds with noise cancellation and premium sound quality",
            price: 16599,
            original_price: Some(19999),
            image: "https://images.unsplash.com/photo-1590658268037-6bf12165a8df?w=400",
            category: Electronics,
            featured: false,
        },
        ProductFixture {
            name: "Designer Leather Handbag",
            description: "Elegant Italian leather handbag with gold-tone hardware",
            price: 37399,
            original_price: None,
            image: "https://images.unsplash.com/photo-1553062407-98eeb64c6a62?w=400",
            category: Fashion,
            featured: true,
        },
        ProductFixture {
            name: "Designer Sunglasses",
            description: "Stylish UV protection sunglasses with polarized lenses",
            price: 14999,
            original_price: Some(17999),
            image: "https://images.unsplash.com/photo-1572635196237-14b3f281503f?w=400",
            category: Fashion,
            featured: false,
        },
        ProductFixture {
            name: "Designer Sneakers",
            description: "Premium athletic sneakers with memory foam insoles",
            price: 20799,
            original_price: None,
            image: "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=400",
            category: Fashion,
            featured: false,
        },
        ProductFixture {
            name: "Premium Watch",
            description: "Luxury timepiece with precision movement and water resistance",
            price: 24999,
            original_price: None,
            image: "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=400",
            category: Accessories,
            featured: true,
        },
        ProductFixture {
            name: "Wireless Charging Pad",
            description: "Fast wireless charging pad compatible with all Qi-enabled devices",
            price: 4149,
            original_price: Some(4999),
            image: "https://images.unsplash.com/photo-1586953208448-b95a79798f07?w=400",
            category: Accessories,
            featured: false,
        },
        ProductFixture {
            name: "Bluetooth Speaker",
            description: "Portable waterproof speaker with 360-degree sound",
            price: 7479,
            original_price: None,
            image: "https://images.unsplash.com/photo-1608043152269-423dbba4e7e1?w=400",
            category: Accessories,
            featured: false,
        },
        ProductFixture {
            name: "Smart Home Hub",
            description: "Central control hub for all your smart home devices",
            price: 12499,
            original_price: None,
            image: "https://images.unsplash.com/photo-1558618666-fcd25c85cd64?w=400",
            category: Home,
            featured: false,
        },
        ProductFixture {
            name: "Robot Vacuum Cleaner",
            description: "Self-charging robot vacuum with mapping technology",
            price: 33199,
            original_price: Some(35999),
            image: "https://images.unsplash.com/photo-1558618666-fcd25c85cd64?w=400",
            category: Home,
            featured: false,
        },
        ProductFixture {
            name: "Fitness Tracker Watch",
            description: "Advanced fitness tracking with GPS and heart rate monitor",
            price: 14999,
            original_price: None,
            image: "https://images.unsplash.com/photo-1579586337278-3befd40fd17a?w=400",
            category: Sports,
            featured: false,
        },
        ProductFixture {
            name: "Yoga Mat Premium",
            description: "Eco-friendly yoga mat with superior grip and cushioning",
            price: 4979,
            original_price: None,
            image: "https://images.unsplash.com/photo-1601925260368-ae2f83cf8b7f?w=400",
            category: Sports,
            featured: false,
        },
        ProductFixture {
            name: "Portable Power Bank",
            description: "20000mAh power bank with fast charging and wireless charging",
            price: 5809,
            original_price: None,
            image: "https://images.unsplash.com/photo-1609091839311-d5365f9ff1c8?w=400",
            category: Other,
            featured: false,
        },
        ProductFixture {
            name: "Camera Drone",
            description: "4K camera drone with GPS and obstacle avoidance",
            price: 49799,
            original_price: Some(54999),
            image: "https://images.unsplash.com/photo-1473968512647-3e447244af8f?w=400",
            category: Other,
            featured: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_cover_every_category() {
        let fixtures = fixtures();
        for category in [
            ProductCategory::Electronics,
            ProductCategory::Fashion,
            ProductCategory::Accessories,
            ProductCategory::Home,
            ProductCategory::Sports,
            ProductCategory::Other,
        ] {
            assert!(
                fixtures.iter().any(|f| f.category == category),
                "missing category {:?}",
                category
            );
        }
    }

    #[test]
    fn fixtures_have_unique_slugs() {
        let fixtures = fixtures();
        let mut slugs: Vec<String> = fixtures.iter().map(|f| generate_slug(f.name)).collect();
        let before = slugs.len();
        slugs.sort();
        slugs.dedup();
        assert_eq!(before, slugs.len());
        assert!(slugs.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn discounted_fixtures_price_below_original() {
        for fixture in fixtures() {
            if let Some(original) = fixture.original_price {
                assert!(
                    original > fixture.price,
                    "{} is not actually discounted",
                    fixture.name
                );
            }
        }
    }
}
