mod add;
mod others;
