use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{ServiceError, ServiceResult};
use crate::models::Story;

/// Uniformly pick one story using the thread RNG
pub fn pick(stories: &[Story]) -> ServiceResult<&Story> {
    pick_with(stories, &mut rand::thread_rng())
}

pub fn pick_with<'a, R: Rng + ?Sized>(stories: &'a [Story], rng: &mut R) -> ServiceResult<&'a Story> {
    stories.choose(rng).ok_or(ServiceError::EmptyPool)
}
