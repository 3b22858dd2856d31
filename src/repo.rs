use jiff::Timestamp;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::debug;

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::{Movie, MovieFields, MovieId},
};

#[derive(Clone)]
pub struct MovieRepo {
    db: DatabaseConnection,
}

impl MovieRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// All movies, newest first.
    pub async fn list(&self) -> AppResult<Vec<Movie>> {
        let rows = movie::Entity::find()
            .order_by_desc(movie::Column::CreatedAt)
            .order_by_desc(movie::Column::Id)
            .all(&self.db)
            .await?;

        rows.into_iter().map(|row| Movie::try_from(row).map_err(AppError::from)).collect()
    }

    pub async fn get(&self, id: MovieId) -> AppResult<Option<Movie>> {
        let row = movie::Entity::find_by_id(id).one(&self.db).await?;
        Ok(row.map(Movie::try_from).transpose()?)
    }

    pub async fn create(&self, fields: MovieFields) -> AppResult<Movie> {
        let now = now_ms();
        let model = movie::ActiveModel {
            id: Default::default(),
            title: Set(fields.title),
            director: Set(fields.director),
            year: Set(fields.year),
            watched: Set(fields.watched),
            review: Set(fields.review),
            rating: Set(fields.rating),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let row = model.insert(&self.db).await?;
        debug!(id = row.id, title = %row.title, "created movie");
        Ok(Movie::try_from(row)?)
    }

    /// Replaces every mutable field of an existing movie. `None` when the id
    /// is unknown.
    pub async fn update(&self, id: MovieId, fields: MovieFields) -> AppResult<Option<Movie>> {
        let Some(existing) = movie::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut model: movie::ActiveModel = existing.into();
        model.title = Set(fields.title);
        model.director = Set(fields.director);
        model.year = Set(fields.year);
        model.watched = Set(fields.watched);
        model.review = Set(fields.review);
        model.rating = Set(fields.rating);
        model.updated_at = Set(now_ms());

        let row = model.update(&self.db).await?;
        debug!(id = row.id, watched = row.watched, "updated movie");
        Ok(Some(Movie::try_from(row)?))
    }

    /// Hard delete. Returns whether a row was removed.
    pub async fn delete(&self, id: MovieId) -> AppResult<bool> {
        let res = movie::Entity::delete_by_id(id).exec(&self.db).await?;
        debug!(id = id, rows = res.rows_affected, "deleted movie");
        Ok(res.rows_affected > 0)
    }
}

impl TryFrom<movie::Model> for Movie {
    type Error = jiff::Error;

    fn try_from(row: movie::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            director: row.director,
            year: row.year,
            watched: row.watched,
            review: row.review,
            rating: row.rating,
            created_at: Timestamp::from_millisecond(row.created_at)?,
            updated_at: Timestamp::from_millisecond(row.updated_at)?,
        })
    }
}

fn now_ms() -> i64 {
    Timestamp::now().as_millisecond()
}
