use super::*;
use crate::db::DbService;
use shared::order::DishStatus;

mod test_persistence;
mod test_products;

const TEST_TZ: Tz = chrono_tz::Europe::Madrid;

async fn create_test_service() -> (OrderService, DbService) {
    let db = DbService::open_in_memory().await.unwrap();
    let service = OrderService::new(&db, TEST_TZ).await;
    (service, db)
}

fn taco() -> ProductDraft {
    ProductDraft::menu("Taco", 30.0)
}

/// New order with one dish, selected and ready for products
fn order_with_dish(service: &mut OrderService) -> (String, String) {
    let order_id = service.create_order();
    let dish_id = service.add_dish().unwrap();
    (order_id, dish_id)
}
