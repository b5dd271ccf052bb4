mod ingredient;
mod instruction;
mod macros;
mod recipe;
mod shopping_item;
mod user;

pub use ingredient::Ingredient;
pub use instruction::{normalize_steps, Instruction};
pub use macros::Macros;
pub use recipe::{Recipe, RecipeInput, RecipePatch, ValidationError};
pub use shopping_item::ShoppingListItem;
pub use user::{PublicUser, Role, User};
