pub mod test_helpers {
    use crate::db;
    use sqlx::{
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
        SqlitePool,
    };
    use std::str::FromStr;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        db::init_schema(&pool).await?;

        Ok(pool)
    }

    /// Insert a test account with a hashed password; returns its uuid.
    pub async fn insert_test_account(
        pool: &SqlitePool,
        email: &str,
        password: &str,
        verified: bool,
    ) -> Result<String, sqlx::Error> {
        use argon2::{
            password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
            Argon2,
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
            })?
            .to_string();

        let user_uuid = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO accounts (user_uuid, email, password_hash, first_name, is_verified) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user_uuid)
        .bind(email)
        .bind(&password_hash)
        .bind("Test")
        .bind(verified)
        .execute(pool)
        .await?;

        Ok(user_uuid)
    }

    /// Overwrite an account's verification token pair directly, e.g. to
    /// back-date an expiration.
    pub async fn set_verification_state(
        pool: &SqlitePool,
        email: &str,
        token: Option<&str>,
        expiration: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE accounts SET verification_token = ?, verification_expiration = ? \
             WHERE email = ?",
        )
        .bind(token)
        .bind(expiration)
        .bind(email)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Overwrite an account's reset state directly.
    pub async fn set_reset_state(
        pool: &SqlitePool,
        email: &str,
        status: &str,
        token: Option<&str>,
        expiration: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE accounts SET reset_status = ?, reset_token = ?, reset_expiration = ? \
             WHERE email = ?",
        )
        .bind(status)
        .bind(token)
        .bind(expiration)
        .bind(email)
        .execute(pool)
        .await?;
        Ok(())
    }
}
