mod models;
mod postgres;
mod querier;
mod store;

pub use self::{
    models::{ArticleRow, CategoryRow, UserRow},
    postgres::{Db, init_db_from_env, migrate},
    querier::{ArticleFilter, Ordering, Querier},
    store::{ArticleChange, NewArticle, Store},
};
