//! Общие типы для backend и клиентов API учета картриджей

pub mod domain;
pub mod enums;
