use sqlx::SqlitePool;
use uuid::Uuid;

use super::recipe_repo::RecipeRow;
use super::{RecipeRepository, StoreError};
use crate::models::Recipe;

/// Per-user favorite recipes.
#[derive(Debug, Clone)]
pub struct FavoritesRepository {
    pool: SqlitePool,
    recipes: RecipeRepository,
}

impl FavoritesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        let recipes = RecipeRepository::new(pool.clone());
        Self { pool, recipes }
    }

    /// Favorites in the order they were added, fully hydrated.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Recipe>, StoreError> {
        self.ensure_user(user_id).await?;

        let rows: Vec<RecipeRow> = sqlx::query_as(
            r#"
            SELECT r.* FROM recipes r
            JOIN favorites f ON f.recipe_id = r.id
            WHERE f.user_id = ?
            ORDER BY f.rowid
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        self.recipes.hydrate_all(rows).await
    }

    /// Adds a favorite. Adding one that is already present changes nothing.
    pub async fn add(&self, user_id: Uuid, recipe_id: Uuid) -> Result<Vec<Recipe>, StoreError> {
        self.ensure_user(user_id).await?;
        self.recipes.get(recipe_id).await?;

        sqlx::query("INSERT OR IGNORE INTO favorites (user_id, recipe_id) VALUES (?, ?)")
            .bind(user_id.to_string())
            .bind(recipe_id.to_string())
            .execute(&self.pool)
            .await?;

        tracing::debug!("User {} favorited recipe {}", user_id, recipe_id);
        self.list(user_id).await
    }

    /// Removes a favorite. Removing one that is absent changes nothing.
    pub async fn remove(&self, user_id: Uuid, recipe_id: Uuid) -> Result<Vec<Recipe>, StoreError> {
        self.ensure_user(user_id).await?;

        sqlx::query("DELETE FROM favorites WHERE user_id = ? AND recipe_id = ?")
            .bind(user_id.to_string())
            .bind(recipe_id.to_string())
            .execute(&self.pool)
            .await?;

        self.list(user_id).await
    }

    async fn ensure_user(&self, user_id: Uuid) -> Result<(), StoreError> {
        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match exists {
            Some(_) => Ok(()),
            None => Err(StoreError::UserNotFound(user_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{create_user, setup_db};
    use crate::db::UserRepository;
    use crate::models::{RecipeInput, Role};

    async fn recipe(repo: &RecipeRepository, title: &str, owner: Uuid) -> Recipe {
        let input = RecipeInput {
            title: title.into(),
            category: "Dinner".into(),
            duration: "30 min".into(),
            ..Default::default()
        };
        repo.create(input, owner).await.unwrap()
    }

    fn titles(recipes: &[Recipe]) -> Vec<&str> {
        recipes.iter().map(|r| r.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_add_is_idempotent_and_ordered() {
        let ctx = setup_db().await;
        let user = create_user(&ctx.pool, "ann", Role::User).await;
        let recipes = RecipeRepository::new(ctx.pool.clone());
        let favorites = FavoritesRepository::new(ctx.pool.clone());

        let soup = recipe(&recipes, "Soup", user.id).await;
        let stew = recipe(&recipes, "Stew", user.id).await;

        favorites.add(user.id, stew.id).await.unwrap();
        favorites.add(user.id, soup.id).await.unwrap();
        let after = favorites.add(user.id, stew.id).await.unwrap();

        assert_eq!(titles(&after), vec!["Stew", "Soup"]);
        // Hydrated, not just ids
        assert_eq!(after[0], stew);
    }

    #[tokio::test]
    async fn test_remove() {
        let ctx = setup_db().await;
        let user = create_user(&ctx.pool, "ann", Role::User).await;
        let recipes = RecipeRepository::new(ctx.pool.clone());
        let favorites = FavoritesRepository::new(ctx.pool.clone());
        let soup = recipe(&recipes, "Soup", user.id).await;

        favorites.add(user.id, soup.id).await.unwrap();
        assert!(favorites.remove(user.id, soup.id).await.unwrap().is_empty());

        // Absent favorite: no-op
        assert!(favorites.remove(user.id, soup.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_recipe_or_user() {
        let ctx = setup_db().await;
        let user = create_user(&ctx.pool, "ann", Role::User).await;
        let favorites = FavoritesRepository::new(ctx.pool.clone());

        assert!(matches!(
            favorites.add(user.id, Uuid::new_v4()).await,
            Err(StoreError::RecipeNotFound(_))
        ));
        assert!(matches!(
            favorites.list(Uuid::new_v4()).await,
            Err(StoreError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_deleted_recipe_leaves_favorites() {
        let ctx = setup_db().await;
        let user = create_user(&ctx.pool, "ann", Role::User).await;
        let recipes = RecipeRepository::new(ctx.pool.clone());
        let favorites = FavoritesRepository::new(ctx.pool.clone());
        let soup = recipe(&recipes, "Soup", user.id).await;
        let stew = recipe(&recipes, "Stew", user.id).await;

        favorites.add(user.id, soup.id).await.unwrap();
        favorites.add(user.id, stew.id).await.unwrap();
        recipes.delete(soup.id, user.id, Role::User).await.unwrap();

        assert_eq!(titles(&favorites.list(user.id).await.unwrap()), vec!["Stew"]);

        let ids = UserRepository::new(ctx.pool.clone())
            .favorite_ids(user.id)
            .await
            .unwrap();
        assert_eq!(ids, vec![stew.id]);
    }
}
