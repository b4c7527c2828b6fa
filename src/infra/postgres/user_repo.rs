use {
    crate::domain::{
        error::PipelineError,
        id::UserId,
        money::{Amount, Balance},
        user::User,
    },
    rust_decimal::Decimal,
    sqlx::PgConnection,
};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name_tag: String,
    balance: Decimal,
    history: Vec<i64>,
}

impl TryFrom<UserRow> for User {
    type Error = PipelineError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::new(row.id),
            name_tag: row.name_tag,
            balance: Balance::new(row.balance)?,
            history: row.history,
        })
    }
}

pub async fn insert_if_missing(
    conn: &mut PgConnection,
    id: UserId,
    name_tag: &str,
) -> Result<(), PipelineError> {
    sqlx::query("INSERT INTO users (id, name_tag) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
        .bind(id.get())
        .bind(name_tag)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn get_user(conn: &mut PgConnection, id: UserId) -> Result<Option<User>, PipelineError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name_tag, balance, history FROM users WHERE id = $1",
    )
    .bind(id.get())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(User::try_from).transpose()
}

/// Overwrite the balance, creating the user if needed. The CHECK constraint
/// backs up the non-negative invariant already carried by `Balance`.
pub async fn set_balance(
    conn: &mut PgConnection,
    id: UserId,
    balance: Balance,
) -> Result<(), PipelineError> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name_tag, balance) VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE SET balance = EXCLUDED.balance
        "#,
    )
    .bind(id.get())
    .bind(User::default_tag(id))
    .bind(balance.value())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Increment in a single statement so concurrent credits to the same user
/// don't overwrite each other.
pub async fn credit_balance(
    conn: &mut PgConnection,
    id: UserId,
    amount: Amount,
) -> Result<Balance, PipelineError> {
    let balance: Decimal = sqlx::query_scalar(
        r#"
        INSERT INTO users (id, name_tag, balance) VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE SET balance = users.balance + EXCLUDED.balance
        RETURNING balance
        "#,
    )
    .bind(id.get())
    .bind(User::default_tag(id))
    .bind(amount.value())
    .fetch_one(&mut *conn)
    .await?;

    Balance::new(balance)
}
