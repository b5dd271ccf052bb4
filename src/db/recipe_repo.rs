use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{parse_uuid, StoreError};
use crate::models::{
    Ingredient, Instruction, Macros, Recipe, RecipeInput, RecipePatch, Role,
};

#[derive(Debug, Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

// Row types for database queries
#[derive(sqlx::FromRow)]
pub(crate) struct RecipeRow {
    id: String,
    title: String,
    category: String,
    duration: String,
    image_url: Option<String>,
    calories: Option<String>,
    carbs: Option<String>,
    protein: Option<String>,
    fat: Option<String>,
    user_id: Option<String>,
    created_at: String,
    updated_at: String,
}

#[derive(sqlx::FromRow)]
struct IngredientRow {
    amount: String,
    name: String,
}

#[derive(sqlx::FromRow)]
struct InstructionRow {
    step_number: i64,
    description: String,
}

/// Owners may change their own recipes; admins may change any recipe.
pub fn can_modify(recipe: &Recipe, requester_id: Uuid, requester_role: Role) -> bool {
    requester_role == Role::Admin || recipe.is_owned_by(requester_id)
}

impl RecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Validates `input` and stores it as a new recipe owned by `owner`.
    pub async fn create(&self, input: RecipeInput, owner: Uuid) -> Result<Recipe, StoreError> {
        let recipe = input.into_recipe(owner)?;
        self.insert(&recipe).await
    }

    /// Stores an already-built recipe as is.
    pub async fn insert(&self, recipe: &Recipe) -> Result<Recipe, StoreError> {
        let mut tx = self.pool.begin().await?;

        let id = recipe.id.to_string();
        sqlx::query(
            r#"
            INSERT INTO recipes (id, title, title_folded, category, duration, image_url, calories, carbs, protein, fat, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&recipe.title)
        .bind(recipe.title.to_lowercase())
        .bind(&recipe.category)
        .bind(&recipe.duration)
        .bind(&recipe.image_url)
        .bind(&recipe.macros.calories)
        .bind(&recipe.macros.carbs)
        .bind(&recipe.macros.protein)
        .bind(&recipe.macros.fat)
        .bind(recipe.owner.map(|o| o.to_string()))
        .bind(recipe.created_at.to_rfc3339())
        .bind(recipe.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        write_children(&mut *tx, recipe).await?;

        tx.commit().await?;

        tracing::debug!("Created recipe {} ({})", recipe.title, recipe.id);
        self.get(recipe.id).await
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Recipe>, StoreError> {
        let row: Option<RecipeRow> = sqlx::query_as("SELECT * FROM recipes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.hydrate_recipe(row).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Recipe, StoreError> {
        self.find(id).await?.ok_or(StoreError::RecipeNotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<Recipe>, StoreError> {
        let rows: Vec<RecipeRow> = sqlx::query_as("SELECT * FROM recipes ORDER BY created_at, rowid")
            .fetch_all(&self.pool)
            .await?;

        self.hydrate_all(rows).await
    }

    /// Applies a partial update on behalf of a requester.
    ///
    /// Fails with `RecipeNotFound` if the recipe is absent and `Forbidden`
    /// unless the requester owns it or is an admin. When an admin edits a
    /// recipe with no recorded owner, ownership is assigned to that admin.
    pub async fn update(
        &self,
        id: Uuid,
        patch: RecipePatch,
        requester_id: Uuid,
        requester_role: Role,
    ) -> Result<Recipe, StoreError> {
        let mut recipe = self.get(id).await?;

        if !can_modify(&recipe, requester_id, requester_role) {
            tracing::info!("User {} not authorized to update recipe {}", requester_id, id);
            return Err(StoreError::Forbidden);
        }

        patch.validate()?;

        // TODO: confirm with product whether this backfill should stay; it
        // changes ownership as a side effect of an unrelated edit.
        if recipe.owner.is_none() && requester_role == Role::Admin {
            tracing::info!("Assigning unowned recipe {} to admin {}", id, requester_id);
            recipe.owner = Some(requester_id);
        }

        patch.apply(&mut recipe);

        let mut tx = self.pool.begin().await?;

        let id_str = recipe.id.to_string();
        sqlx::query(
            r#"
            UPDATE recipes
            SET title = ?, title_folded = ?, category = ?, duration = ?, image_url = ?,
                calories = ?, carbs = ?, protein = ?, fat = ?, user_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&recipe.title)
        .bind(recipe.title.to_lowercase())
        .bind(&recipe.category)
        .bind(&recipe.duration)
        .bind(&recipe.image_url)
        .bind(&recipe.macros.calories)
        .bind(&recipe.macros.carbs)
        .bind(&recipe.macros.protein)
        .bind(&recipe.macros.fat)
        .bind(recipe.owner.map(|o| o.to_string()))
        .bind(recipe.updated_at.to_rfc3339())
        .bind(&id_str)
        .execute(&mut *tx)
        .await?;

        // Replace child rows
        for table in ["ingredients", "instructions", "recipe_tags"] {
            sqlx::query(&format!("DELETE FROM {} WHERE recipe_id = ?", table))
                .bind(&id_str)
                .execute(&mut *tx)
                .await?;
        }
        write_children(&mut *tx, &recipe).await?;

        tx.commit().await?;

        self.get(id).await
    }

    /// Deletes a recipe on behalf of a requester (owner or admin only).
    pub async fn delete(
        &self,
        id: Uuid,
        requester_id: Uuid,
        requester_role: Role,
    ) -> Result<(), StoreError> {
        let recipe = self.get(id).await?;

        if !can_modify(&recipe, requester_id, requester_role) {
            tracing::info!("User {} not authorized to delete recipe {}", requester_id, id);
            return Err(StoreError::Forbidden);
        }

        // CASCADE will handle ingredients, instructions, tags and favorites
        sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        tracing::info!("Deleted recipe {}", id);
        Ok(())
    }

    /// Case-insensitive substring match on title, and/or any-of tag match.
    /// Filters that are absent or empty are ignored.
    pub async fn search(
        &self,
        title: Option<&str>,
        tags: &[String],
    ) -> Result<Vec<Recipe>, StoreError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT r.* FROM recipes r WHERE 1 = 1");

        if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
            query.push(" AND r.title_folded LIKE ");
            query.push_bind(format!("%{}%", escape_like(&title.to_lowercase())));
            query.push(" ESCAPE '\\'");
        }

        if !tags.is_empty() {
            query.push(
                " AND EXISTS (SELECT 1 FROM recipe_tags t WHERE t.recipe_id = r.id AND t.tag IN (",
            );
            let mut separated = query.separated(", ");
            for tag in tags {
                separated.push_bind(tag.clone());
            }
            separated.push_unseparated("))");
        }

        query.push(" ORDER BY r.created_at, r.rowid");

        let rows: Vec<RecipeRow> = query.build_query_as::<RecipeRow>().fetch_all(&self.pool).await?;
        self.hydrate_all(rows).await
    }

    /// Recipes with exactly this category. An empty result is reported as
    /// `EmptyCategory`, distinct from a query failure.
    pub async fn by_category(&self, category: &str) -> Result<Vec<Recipe>, StoreError> {
        let rows: Vec<RecipeRow> =
            sqlx::query_as("SELECT * FROM recipes WHERE category = ? ORDER BY created_at, rowid")
                .bind(category)
                .fetch_all(&self.pool)
                .await?;

        if rows.is_empty() {
            return Err(StoreError::EmptyCategory(category.to_string()));
        }
        self.hydrate_all(rows).await
    }

    /// Every distinct tag in use, sorted.
    pub async fn tags(&self) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT tag FROM recipe_tags ORDER BY tag")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(tag,)| tag).collect())
    }

    pub(crate) async fn hydrate_all(&self, rows: Vec<RecipeRow>) -> Result<Vec<Recipe>, StoreError> {
        let mut recipes = Vec::with_capacity(rows.len());
        for row in rows {
            recipes.push(self.hydrate_recipe(row).await?);
        }
        Ok(recipes)
    }

    async fn hydrate_recipe(&self, row: RecipeRow) -> Result<Recipe, StoreError> {
        let ingredients: Vec<IngredientRow> = sqlx::query_as(
            "SELECT amount, name FROM ingredients WHERE recipe_id = ? ORDER BY position",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let instructions: Vec<InstructionRow> = sqlx::query_as(
            "SELECT step_number, description FROM instructions WHERE recipe_id = ? ORDER BY step_number",
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let tags: Vec<(String,)> =
            sqlx::query_as("SELECT tag FROM recipe_tags WHERE recipe_id = ? ORDER BY position")
                .bind(&row.id)
                .fetch_all(&self.pool)
                .await?;

        let owner = row.user_id.as_deref().map(parse_uuid).transpose()?;

        Ok(Recipe {
            id: parse_uuid(&row.id)?,
            title: row.title,
            category: row.category,
            duration: row.duration,
            image_url: row.image_url,
            ingredients: ingredients
                .into_iter()
                .map(|i| Ingredient::new(i.amount, i.name))
                .collect(),
            instructions: instructions
                .into_iter()
                .map(|i| Instruction {
                    step_number: i.step_number as u32,
                    description: i.description,
                })
                .collect(),
            macros: Macros {
                calories: row.calories,
                carbs: row.carbs,
                protein: row.protein,
                fat: row.fat,
            },
            owner,
            tags: tags.into_iter().map(|(tag,)| tag).collect(),
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        })
    }
}

async fn write_children(conn: &mut SqliteConnection, recipe: &Recipe) -> Result<(), sqlx::Error> {
    let id = recipe.id.to_string();

    for (position, ingredient) in recipe.ingredients.iter().enumerate() {
        sqlx::query("INSERT INTO ingredients (recipe_id, position, amount, name) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(position as i64)
            .bind(&ingredient.amount)
            .bind(&ingredient.name)
            .execute(&mut *conn)
            .await?;
    }

    for (position, step) in recipe.instructions.iter().enumerate() {
        // Stored numbering is always the 1-based position
        sqlx::query(
            "INSERT INTO instructions (recipe_id, step_number, description) VALUES (?, ?, ?)",
        )
        .bind(&id)
        .bind(position as i64 + 1)
        .bind(&step.description)
        .execute(&mut *conn)
        .await?;
    }

    for (position, tag) in recipe.tags.iter().enumerate() {
        sqlx::query("INSERT OR IGNORE INTO recipe_tags (recipe_id, position, tag) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(position as i64)
            .bind(tag)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
