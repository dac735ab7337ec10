use common::{OrderId, ProductId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    OrderApproved, OrderCreated, OrderStatus, PaymentDetails, PaymentProcessed, ProductReserved,
    User,
};
use saga::{
    InMemoryCommandGateway, InMemoryQueryGateway, InMemoryUpdateEmitter, ManualDeadlineManager,
    OrderSaga, SagaConfig, SagaManager,
};
use saga_store::InMemorySagaStore;

type BenchManager = SagaManager<
    InMemorySagaStore,
    InMemoryCommandGateway,
    InMemoryQueryGateway,
    ManualDeadlineManager,
    InMemoryUpdateEmitter,
>;

fn manager() -> BenchManager {
    let queries = InMemoryQueryGateway::new();
    queries.add_user(User {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        user_id: UserId::new("user-1"),
        payment_details: PaymentDetails {
            name: "Jane Doe".to_string(),
            card_number: "4111111111111111".to_string(),
            valid_until_month: 12,
            valid_until_year: 2030,
            cvv: "123".to_string(),
        },
    });
    let saga = OrderSaga::new(
        InMemoryCommandGateway::new(),
        queries,
        ManualDeadlineManager::new(),
        InMemoryUpdateEmitter::new(),
        SagaConfig::default(),
    );
    SagaManager::new(InMemorySagaStore::new(), saga)
}

async fn run_happy_path(manager: &BenchManager) {
    let order_id = OrderId::new();
    let created = OrderCreated {
        order_id,
        product_id: ProductId::new("product-1"),
        quantity: 1,
        user_id: UserId::new("user-1"),
    };
    let reserved = ProductReserved {
        order_id,
        product_id: created.product_id.clone(),
        quantity: 1,
        user_id: created.user_id.clone(),
    };

    manager.dispatch(created.into()).await.unwrap();
    manager.dispatch(reserved.into()).await.unwrap();
    manager
        .dispatch(PaymentProcessed { order_id }.into())
        .await
        .unwrap();
    manager
        .dispatch(
            OrderApproved {
                order_id,
                order_status: OrderStatus::Approved,
            }
            .into(),
        )
        .await
        .unwrap();
}

fn bench_happy_path(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let manager = manager();

    c.bench_function("saga/happy_path", |b| {
        b.iter(|| rt.block_on(run_happy_path(&manager)));
    });
}

fn bench_happy_path_100_orders(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let manager = manager();

    c.bench_function("saga/happy_path_100_orders", |b| {
        b.iter(|| {
            rt.block_on(async {
                for _ in 0..100 {
                    run_happy_path(&manager).await;
                }
            });
        });
    });
}

fn bench_query_failure_compensation(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let deadlines = ManualDeadlineManager::new();
    let queries = InMemoryQueryGateway::new();
    queries.fail_with("user not found");
    let manager: BenchManager = SagaManager::new(
        InMemorySagaStore::new(),
        OrderSaga::new(
            InMemoryCommandGateway::new(),
            queries,
            deadlines,
            InMemoryUpdateEmitter::new(),
            SagaConfig::default(),
        ),
    );

    c.bench_function("saga/query_failure_compensation", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order_id = OrderId::new();
                let created = OrderCreated {
                    order_id,
                    product_id: ProductId::new("product-1"),
                    quantity: 1,
                    user_id: UserId::new("user-1"),
                };
                let reserved = ProductReserved {
                    order_id,
                    product_id: created.product_id.clone(),
                    quantity: 1,
                    user_id: created.user_id.clone(),
                };
                manager.dispatch(created.into()).await.unwrap();
                manager.dispatch(reserved.into()).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_happy_path,
    bench_happy_path_100_orders,
    bench_query_failure_compensation
);
criterion_main!(benches);
