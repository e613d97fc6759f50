pub(crate) mod notification;
