//! Input validation for write payloads
//!
//! Checks run top to bottom and stop at the first violation, which is the
//! one reported to the client. Nothing here touches the database; checks
//! that need it (tag and ingredient existence, unique email) live in the
//! handlers.

use regex::Regex;
use std::{collections::HashSet, sync::OnceLock};

use crate::{
    error::{ApiError, ApiResult},
    images::{DecodedImage, decode_data_uri},
    messages,
    models::{recipe::RecipeWriteRequest, user::CreateUserRequest},
};

pub const RECIPE_NAME_MAX_LENGTH: usize = 200;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const USER_FIELD_MAX_LENGTH: usize = 150;
pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Configured lower bounds for recipe numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeLimits {
    pub cooking_time_min: i32,
    pub ingredient_amount_min: i32,
}

impl Default for RecipeLimits {
    fn default() -> Self {
        Self {
            cooking_time_min: 1,
            ingredient_amount_min: 1,
        }
    }
}

fn require_text(field: &'static str, value: &str, max_length: Option<usize>) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(field, messages::FIELD_BLANK));
    }
    if let Some(max) = max_length {
        if value.chars().count() > max {
            return Err(ApiError::validation(field, messages::field_too_long(max)));
        }
    }
    Ok(())
}

/// Validate a recipe create/update payload and decode its image
pub fn validate_recipe(
    payload: &RecipeWriteRequest,
    limits: RecipeLimits,
) -> ApiResult<DecodedImage> {
    require_text("name", &payload.name, Some(RECIPE_NAME_MAX_LENGTH))?;
    require_text("text", &payload.text, None)?;
    require_text("image", &payload.image, None)?;
    let image = decode_data_uri(&payload.image)?;

    if payload.cooking_time < limits.cooking_time_min {
        return Err(ApiError::validation(
            "cooking_time",
            messages::cooking_time_too_low(limits.cooking_time_min),
        ));
    }

    if payload.tags.is_empty() {
        return Err(ApiError::validation("tags", messages::TAGS_EMPTY));
    }
    let unique_tags: HashSet<i64> = payload.tags.iter().copied().collect();
    if unique_tags.len() != payload.tags.len() {
        return Err(ApiError::validation("tags", messages::TAGS_NOT_UNIQUE));
    }

    if payload.ingredients.is_empty() {
        return Err(ApiError::validation(
            "ingredients",
            messages::INGREDIENTS_EMPTY,
        ));
    }
    let mut seen = HashSet::with_capacity(payload.ingredients.len());
    for ingredient in &payload.ingredients {
        if ingredient.amount < limits.ingredient_amount_min {
            return Err(ApiError::validation(
                "ingredients",
                messages::ingredient_amount_too_low(limits.ingredient_amount_min),
            ));
        }
        seen.insert(ingredient.id);
    }
    if seen.len() != payload.ingredients.len() {
        return Err(ApiError::validation(
            "ingredients",
            messages::INGREDIENTS_NOT_UNIQUE,
        ));
    }

    Ok(image)
}

/// Validate email
pub fn validate_email(email: &str) -> ApiResult<()> {
    require_text("email", email, Some(EMAIL_MAX_LENGTH))?;

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(ApiError::validation("email", messages::INVALID_EMAIL));
    }

    Ok(())
}

/// Validate username
pub fn validate_username(username: &str) -> ApiResult<()> {
    require_text("username", username, Some(USER_FIELD_MAX_LENGTH))?;

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err(ApiError::validation("username", messages::INVALID_USERNAME));
    }

    Ok(())
}

/// Validate password
pub fn validate_password(field: &'static str, password: &str) -> ApiResult<()> {
    let length = password.chars().count();

    if length < PASSWORD_MIN_LENGTH {
        return Err(ApiError::validation(
            field,
            messages::password_too_short(PASSWORD_MIN_LENGTH),
        ));
    }

    if length > PASSWORD_MAX_LENGTH {
        return Err(ApiError::validation(
            field,
            messages::field_too_long(PASSWORD_MAX_LENGTH),
        ));
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation(
            field,
            messages::PASSWORD_ENTIRELY_NUMERIC,
        ));
    }

    Ok(())
}

/// Validate a registration payload
pub fn validate_new_user(payload: &CreateUserRequest) -> ApiResult<()> {
    validate_email(&payload.email)?;
    validate_username(&payload.username)?;
    require_text("first_name", &payload.first_name, Some(USER_FIELD_MAX_LENGTH))?;
    require_text("last_name", &payload.last_name, Some(USER_FIELD_MAX_LENGTH))?;
    validate_password("password", &payload.password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recipe::IngredientAmount;

    fn payload() -> RecipeWriteRequest {
        RecipeWriteRequest {
            name: "Pancakes".to_string(),
            text: "Mix and fry.".to_string(),
            image: "data:image/png;base64,iVBORw0KGgo=".to_string(),
            cooking_time: 20,
            tags: vec![1, 2],
            ingredients: vec![
                IngredientAmount { id: 10, amount: 200 },
                IngredientAmount { id: 11, amount: 2 },
            ],
        }
    }

    fn rejected_field<T: std::fmt::Debug>(result: ApiResult<T>) -> (&'static str, String) {
        match result {
            Err(ApiError::Validation { field, message }) => (field, message),
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_recipe_passes() {
        let image = validate_recipe(&payload(), RecipeLimits::default()).unwrap();
        assert_eq!(image.extension, "png");
    }

    #[test]
    fn test_undecodable_image_reported_before_domain_rules() {
        let mut recipe = payload();
        recipe.image = "data:image/png;base64,@@@".to_string();
        recipe.cooking_time = 0;

        let (field, message) = rejected_field(validate_recipe(&recipe, RecipeLimits::default()));
        assert_eq!(field, "image");
        assert_eq!(message, messages::INVALID_IMAGE);
    }

    #[test]
    fn test_cooking_time_below_minimum() {
        let mut recipe = payload();
        recipe.cooking_time = 0;

        let (field, message) = rejected_field(validate_recipe(&recipe, RecipeLimits::default()));
        assert_eq!(field, "cooking_time");
        assert_eq!(message, messages::cooking_time_too_low(1));
        assert!(message.contains("one minute"));
    }

    #[test]
    fn test_cooking_time_minimum_is_configurable() {
        let limits = RecipeLimits {
            cooking_time_min: 30,
            ..RecipeLimits::default()
        };

        let (field, message) = rejected_field(validate_recipe(&payload(), limits));
        assert_eq!(field, "cooking_time");
        assert_eq!(message, "Cooking time cannot be less than 30 minutes!");
    }

    #[test]
    fn test_empty_tags() {
        let mut recipe = payload();
        recipe.tags.clear();

        let (field, message) = rejected_field(validate_recipe(&recipe, RecipeLimits::default()));
        assert_eq!(field, "tags");
        assert_eq!(message, messages::TAGS_EMPTY);
    }

    #[test]
    fn test_duplicate_tags() {
        let mut recipe = payload();
        recipe.tags = vec![1, 2, 1];

        let (_, message) = rejected_field(validate_recipe(&recipe, RecipeLimits::default()));
        assert_eq!(message, messages::TAGS_NOT_UNIQUE);
    }

    #[test]
    fn test_empty_ingredients() {
        let mut recipe = payload();
        recipe.ingredients.clear();

        let (field, message) = rejected_field(validate_recipe(&recipe, RecipeLimits::default()));
        assert_eq!(field, "ingredients");
        assert_eq!(message, messages::INGREDIENTS_EMPTY);
    }

    #[test]
    fn test_amount_below_minimum_names_the_minimum() {
        let mut recipe = payload();
        recipe.ingredients[1].amount = 2;
        let limits = RecipeLimits {
            ingredient_amount_min: 5,
            ..RecipeLimits::default()
        };

        let (field, message) = rejected_field(validate_recipe(&recipe, limits));
        assert_eq!(field, "ingredients");
        assert_eq!(message, messages::ingredient_amount_too_low(5));
        assert!(message.contains('5'));
    }

    #[test]
    fn test_duplicate_ingredients() {
        let mut recipe = payload();
        recipe.ingredients.push(IngredientAmount { id: 10, amount: 1 });

        let (_, message) = rejected_field(validate_recipe(&recipe, RecipeLimits::default()));
        assert_eq!(message, messages::INGREDIENTS_NOT_UNIQUE);
    }

    #[test]
    fn test_first_violation_wins() {
        let mut recipe = payload();
        recipe.cooking_time = 0;
        recipe.tags.clear();
        recipe.ingredients.clear();

        let (field, _) = rejected_field(validate_recipe(&recipe, RecipeLimits::default()));
        assert_eq!(field, "cooking_time");
    }

    #[test]
    fn test_low_amount_reported_before_duplicate_ingredient() {
        let mut recipe = payload();
        recipe.ingredients = vec![
            IngredientAmount { id: 10, amount: 1 },
            IngredientAmount { id: 10, amount: 0 },
        ];

        let (_, message) = rejected_field(validate_recipe(&recipe, RecipeLimits::default()));
        assert_eq!(message, messages::ingredient_amount_too_low(1));
    }

    #[test]
    fn test_blank_and_long_names() {
        let mut recipe = payload();
        recipe.name = "   ".to_string();
        let (field, message) = rejected_field(validate_recipe(&recipe, RecipeLimits::default()));
        assert_eq!(field, "name");
        assert_eq!(message, messages::FIELD_BLANK);

        recipe.name = "x".repeat(RECIPE_NAME_MAX_LENGTH + 1);
        let (field, _) = rejected_field(validate_recipe(&recipe, RecipeLimits::default()));
        assert_eq!(field, "name");
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("chef.anna+1@home").is_ok());
        assert!(validate_username("no spaces").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("cook@example.com").is_ok());
        assert!(validate_email("cook@localhost").is_err());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("password", "s3cret-pass").is_ok());
        assert!(validate_password("password", "short").is_err());
        assert!(validate_password("password", "1234567890").is_err());

        let (_, message) = rejected_field(validate_password("password", "1234567890"));
        assert_eq!(message, messages::PASSWORD_ENTIRELY_NUMERIC);
    }

    #[test]
    fn test_new_user_requires_names() {
        let payload = CreateUserRequest {
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "".to_string(),
            last_name: "Smith".to_string(),
            password: "s3cret-pass".to_string(),
        };

        let (field, _) = rejected_field(validate_new_user(&payload));
        assert_eq!(field, "first_name");
    }
}
