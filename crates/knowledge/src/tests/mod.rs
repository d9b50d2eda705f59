mod fallback_chain;
