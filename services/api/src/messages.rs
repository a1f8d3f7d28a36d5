//! User-facing error messages

pub const TAGS_EMPTY: &str = "A recipe must have at least one tag!";
pub const TAGS_NOT_UNIQUE: &str = "Tags must not repeat!";
pub const TAG_DOES_NOT_EXIST: &str = "Such a tag does not exist!";
pub const INGREDIENTS_EMPTY: &str = "A recipe must have at least one ingredient!";
pub const INGREDIENTS_NOT_UNIQUE: &str = "Ingredients must not repeat!";
pub const INGREDIENT_DOES_NOT_EXIST: &str = "Such an ingredient does not exist!";
pub const FIELD_BLANK: &str = "This field may not be blank.";
pub const INVALID_IMAGE: &str = "Upload a valid image.";

pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const PASSWORD_ENTIRELY_NUMERIC: &str = "This password is entirely numeric.";

/// Rejection for a cooking time below `min_value` minutes
pub fn cooking_time_too_low(min_value: i32) -> String {
    match min_value {
        1 => "Cooking time cannot be less than one minute!".to_string(),
        n => format!("Cooking time cannot be less than {n} minutes!"),
    }
}

/// Rejection for a password shorter than `min_length`
pub fn password_too_short(min_length: usize) -> String {
    format!("This password is too short. It must contain at least {min_length} characters.")
}

/// Rejection for an ingredient amount below `min_value`
pub fn ingredient_amount_too_low(min_value: i32) -> String {
    format!("Ingredient amount cannot be less than {min_value}!")
}

/// Rejection for a text field longer than `max_length` characters
pub fn field_too_long(max_length: usize) -> String {
    format!("Ensure this field has no more than {max_length} characters.")
}

pub const FAVORITE_ALREADY_EXISTS: &str = "This recipe is already in your favorites!";
pub const FAVORITE_DOES_NOT_EXIST: &str = "This recipe is not in your favorites!";

pub const SUBSCRIBE_TO_YOURSELF: &str = "You cannot subscribe to yourself!";
pub const SUBSCRIBE_TWICE: &str = "You cannot subscribe twice!";
pub const UNSUBSCRIBE_NOT_SUBSCRIBED: &str =
    "You cannot unsubscribe from this user, you are not subscribed to them!";

pub const SHOPPING_LIST_DOES_NOT_EXIST: &str = "The shopping list does not exist!";
pub const SHOPPING_CART_ALREADY_ADDED: &str = "The recipe is already added!";
pub const SHOPPING_CART_NOT_PRESENT: &str =
    "You cannot remove a recipe that is not in your shopping list!";

pub const USER_BLOCKED: &str = "This account is temporarily blocked!";
pub const USER_NOT_FOUND: &str = "User not found!";
pub const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";
pub const INVALID_PASSWORD: &str = "Invalid password.";
pub const EMAIL_TAKEN: &str = "A user with that email already exists.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

pub const RECIPE_NOT_FOUND: &str = "Recipe not found.";
pub const TAG_NOT_FOUND: &str = "Tag not found.";
pub const INGREDIENT_NOT_FOUND: &str = "Ingredient not found.";
pub const INVALID_PAGE: &str = "Invalid page.";
pub const NOT_FOUND: &str = "Not found.";

pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided or are invalid.";
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";
pub const INTERNAL_ERROR: &str = "Internal server error";
